//! Overlay rendering onto a 2D canvas
//!
//! Objects are stored in unscaled overlay coordinates; `scale` is the current
//! zoom.

use pdfdesk_core::annotation::Bounds;
use pdfdesk_core::AnnotationObject;
use std::f64::consts::TAU;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

const SELECTION_COLOR: &str = "#2563eb";
const SELECTION_PADDING: f64 = 4.0;

/// Clear the overlay and draw `objects` bottom to top
pub fn draw_overlay(
    ctx: &CanvasRenderingContext2d,
    objects: &[AnnotationObject],
    selected: Option<usize>,
    scale: f64,
) -> Result<(), JsValue> {
    if let Some(canvas) = ctx.canvas() {
        ctx.clear_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
    }

    ctx.save();
    let drawn = draw_scaled(ctx, objects, selected, scale);
    ctx.restore();
    drawn
}

/// Runs between `save` and `restore` so an error never leaks the transform
fn draw_scaled(
    ctx: &CanvasRenderingContext2d,
    objects: &[AnnotationObject],
    selected: Option<usize>,
    scale: f64,
) -> Result<(), JsValue> {
    ctx.scale(scale, scale)?;
    for object in objects {
        draw_object(ctx, object)?;
    }
    if let Some(object) = selected.and_then(|i| objects.get(i)) {
        draw_selection(ctx, object.bounds())?;
    }
    Ok(())
}

fn draw_object(ctx: &CanvasRenderingContext2d, object: &AnnotationObject) -> Result<(), JsValue> {
    match object {
        AnnotationObject::Text {
            position,
            content,
            color,
            font_size,
            font_family,
        } => {
            ctx.set_fill_style(&JsValue::from_str(&color.to_hex()));
            ctx.set_font(&format!("{}px {}", font_size, font_family));
            ctx.set_text_baseline("top");
            ctx.fill_text(content, position.x, position.y)?;
        }
        AnnotationObject::Rectangle {
            position,
            size,
            stroke_color,
            stroke_width,
        } => {
            set_stroke(ctx, &stroke_color.to_hex(), *stroke_width);
            ctx.stroke_rect(position.x, position.y, size.width, size.height);
        }
        AnnotationObject::Circle {
            position,
            radius,
            stroke_color,
            stroke_width,
        } => {
            set_stroke(ctx, &stroke_color.to_hex(), *stroke_width);
            ctx.begin_path();
            ctx.arc(position.x + radius, position.y + radius, *radius, 0.0, TAU)?;
            ctx.stroke();
        }
        AnnotationObject::FreehandPath {
            points,
            stroke_color,
            stroke_width,
        } => {
            let Some((first, rest)) = points.split_first() else {
                return Ok(());
            };
            set_stroke(ctx, &stroke_color.to_hex(), *stroke_width);
            ctx.set_line_cap("round");
            ctx.set_line_join("round");
            ctx.begin_path();
            ctx.move_to(first.x, first.y);
            for p in rest {
                ctx.line_to(p.x, p.y);
            }
            ctx.stroke();
        }
    }
    Ok(())
}

fn set_stroke(ctx: &CanvasRenderingContext2d, color: &str, width: f64) {
    ctx.set_stroke_style(&JsValue::from_str(color));
    ctx.set_line_width(width);
}

fn draw_selection(ctx: &CanvasRenderingContext2d, bounds: Bounds) -> Result<(), JsValue> {
    let dash = js_sys::Array::of2(&JsValue::from_f64(4.0), &JsValue::from_f64(4.0));
    ctx.set_line_dash(&dash)?;
    set_stroke(ctx, SELECTION_COLOR, 1.0);
    ctx.stroke_rect(
        bounds.x - SELECTION_PADDING,
        bounds.y - SELECTION_PADDING,
        bounds.width + SELECTION_PADDING * 2.0,
        bounds.height + SELECTION_PADDING * 2.0,
    );
    ctx.set_line_dash(&js_sys::Array::new())?;
    Ok(())
}
