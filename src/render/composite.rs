//! Canvas operations: alpha blending layers, pasting frames into sheets.

use image::{imageops, Rgba, RgbaImage};

use crate::types::Size;

/// A transparent black canvas.
pub fn new_canvas((width, height): Size) -> RgbaImage {
    RgbaImage::new(width, height)
}

/// Blend `overlay` onto a copy of `base` with its top-left corner at
/// `position`. The result has the size of `base`; overlay pixels outside it
/// are clipped.
pub fn blend(base: &RgbaImage, overlay: &RgbaImage, position: (i64, i64)) -> RgbaImage {
    let mut out = base.clone();
    blend_in_place(&mut out, overlay, position);
    out
}

/// In-place form of [`blend`].
///
/// Every canvas pixel takes part: pixels outside the overlay are blended
/// against transparent black, as if the overlay had first been expanded to
/// a canvas-sized transparent layer.
pub fn blend_in_place(canvas: &mut RgbaImage, overlay: &RgbaImage, (ox, oy): (i64, i64)) {
    let (ow, oh) = (i64::from(overlay.width()), i64::from(overlay.height()));

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let sx = i64::from(x) - ox;
        let sy = i64::from(y) - oy;
        let fg = if sx >= 0 && sy >= 0 && sx < ow && sy < oh {
            overlay.get_pixel(sx as u32, sy as u32).0
        } else {
            [0, 0, 0, 0]
        };
        *pixel = Rgba(over(fg, pixel.0));
    }
}

/// Straight-alpha "over": `a = fa + ba(1 - fa)`, `c = f·fa + b·ba(1 - fa)`.
fn over(fg: [u8; 4], bg: [u8; 4]) -> [u8; 4] {
    let fa = f32::from(fg[3]) / 255.0;
    let ba = f32::from(bg[3]) / 255.0;
    let inv = ba * (1.0 - fa);

    let mut out = [0u8; 4];
    for i in 0..3 {
        out[i] = to_byte(f32::from(fg[i]) * fa + f32::from(bg[i]) * inv);
    }
    out[3] = to_byte((fa + inv) * 255.0);
    out
}

fn to_byte(v: f32) -> u8 {
    v.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Copy `image` onto `canvas` at `position`, replacing pixels (no blending).
pub fn paste(canvas: &mut RgbaImage, image: &RgbaImage, (x, y): (u32, u32)) {
    imageops::replace(canvas, image, i64::from(x), i64::from(y));
}

/// Return a canvas of at least `size`, keeping existing pixels at the origin.
/// Canvases never shrink.
pub fn grow(canvas: RgbaImage, (width, height): Size) -> RgbaImage {
    let width = width.max(canvas.width());
    let height = height.max(canvas.height());
    if (width, height) == canvas.dimensions() {
        return canvas;
    }

    let mut grown = new_canvas((width, height));
    paste(&mut grown, &canvas, (0, 0));
    grown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(rgba))
    }

    #[test]
    fn test_new_canvas_is_transparent() {
        let canvas = new_canvas((3, 2));
        assert_eq!(canvas.dimensions(), (3, 2));
        assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_opaque_over_anything_is_opaque() {
        let base = solid(2, 2, [0, 0, 255, 255]);
        let out = blend(&base, &solid(1, 1, [255, 0, 0, 255]), (1, 1));

        assert_eq!(out.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_half_alpha_over_transparent() {
        let base = new_canvas((1, 1));
        let out = blend(&base, &solid(1, 1, [255, 0, 0, 128]), (0, 0));
        // 255 * 128/255 = 128, alpha 128
        assert_eq!(out.get_pixel(0, 0).0, [128, 0, 0, 128]);
    }

    #[test]
    fn test_half_alpha_over_opaque() {
        let base = solid(1, 1, [0, 0, 255, 255]);
        let out = blend(&base, &solid(1, 1, [255, 0, 0, 128]), (0, 0));
        let fa = 128.0f32 / 255.0;
        let expected_b = (255.0 * (1.0 - fa)).round_ties_even() as u8;
        assert_eq!(out.get_pixel(0, 0).0, [128, 0, expected_b, 255]);
    }

    #[test]
    fn test_overlay_is_clipped() {
        let base = new_canvas((2, 2));
        let out = blend(&base, &solid(3, 3, [9, 9, 9, 255]), (1, -1));

        assert_eq!(out.dimensions(), (2, 2));
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(out.get_pixel(1, 0).0, [9, 9, 9, 255]);
        assert_eq!(out.get_pixel(1, 1).0, [9, 9, 9, 255]);
        assert_eq!(out.get_pixel(0, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_blend_does_not_touch_base() {
        let base = solid(1, 1, [10, 10, 10, 255]);
        let _ = blend(&base, &solid(1, 1, [200, 0, 0, 255]), (0, 0));
        assert_eq!(base.get_pixel(0, 0).0, [10, 10, 10, 255]);
    }

    #[test]
    fn test_paste_replaces_pixels() {
        let mut canvas = solid(2, 1, [1, 1, 1, 255]);
        paste(&mut canvas, &solid(1, 1, [0, 0, 0, 0]), (1, 0));
        assert_eq!(canvas.get_pixel(0, 0).0, [1, 1, 1, 255]);
        assert_eq!(canvas.get_pixel(1, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_grow_keeps_content_and_never_shrinks() {
        let canvas = solid(2, 2, [5, 5, 5, 255]);
        let grown = grow(canvas, (4, 1));

        assert_eq!(grown.dimensions(), (4, 2));
        assert_eq!(grown.get_pixel(1, 1).0, [5, 5, 5, 255]);
        assert_eq!(grown.get_pixel(3, 0).0, [0, 0, 0, 0]);
    }
}
