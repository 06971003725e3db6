//! `Canvas` over the browser 2D context

use std::f64::consts::TAU;

use glam::Vec2;
use web_sys::CanvasRenderingContext2d;

use super::{Align, Canvas};

impl Canvas for CanvasRenderingContext2d {
    fn clear(&mut self, width: f32, height: f32, color: &str) {
        self.set_fill_style_str(color);
        CanvasRenderingContext2d::fill_rect(self, 0.0, 0.0, width as f64, height as f64);
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.set_global_alpha(alpha.clamp(0.0, 1.0) as f64);
    }

    fn set_glow(&mut self, blur: f32, color: &str) {
        self.set_shadow_blur(blur as f64);
        self.set_shadow_color(color);
    }

    fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: &str) {
        self.set_fill_style_str(color);
        CanvasRenderingContext2d::fill_rect(
            self,
            pos.x as f64,
            pos.y as f64,
            size.x as f64,
            size.y as f64,
        );
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str) {
        self.set_fill_style_str(color);
        self.begin_path();
        if self
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU)
            .is_ok()
        {
            self.fill();
        }
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: &str) {
        self.set_stroke_style_str(color);
        self.set_line_width(width as f64);
        self.begin_path();
        if self
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU)
            .is_ok()
        {
            self.stroke();
        }
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, size: f32, align: Align, color: &str) {
        self.set_fill_style_str(color);
        self.set_font(&format!("{size:.0}px monospace"));
        self.set_text_align(match align {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        });
        let _ = CanvasRenderingContext2d::fill_text(self, text, pos.x as f64, pos.y as f64);
    }
}
