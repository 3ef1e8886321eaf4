//! Palette swaps.
//!
//! Inputs name the key colours painted into their layers; themes name the
//! colours those keys become. A [`ColourMap`] joins the two by colour name.

use image::{Rgba, RgbaImage};

use crate::config::OrderedMap;
use crate::error::Result;
use crate::types::Colour;

/// One source -> destination substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement {
    pub source: Colour,
    pub dest: Colour,
}

/// Substitution table keyed by source RGB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColourMap {
    replacements: Vec<Replacement>,
}

impl ColourMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a theme with an input palette.
    ///
    /// Colour names missing on either side are dropped. When two entries
    /// share a source RGB the later one replaces the earlier.
    pub fn build(theme: &OrderedMap<String>, input_colours: &OrderedMap<String>) -> Result<Self> {
        let mut map = Self::new();
        for (name, dest) in theme.iter() {
            let Some(source) = input_colours.get(name) else {
                continue;
            };
            map.insert(Colour::from_hex(source)?, Colour::from_hex(dest)?);
        }
        Ok(map)
    }

    pub fn insert(&mut self, source: Colour, dest: Colour) {
        let replacement = Replacement { source, dest };
        match self
            .replacements
            .iter_mut()
            .find(|r| r.source.to_rgb() == source.to_rgb())
        {
            Some(slot) => *slot = replacement,
            None => self.replacements.push(replacement),
        }
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    fn lookup(&self, rgb: [u8; 3]) -> Option<&Replacement> {
        self.replacements.iter().find(|r| r.source.to_rgb() == rgb)
    }

    /// Recolour a bitmap in place.
    ///
    /// A pixel is replaced when its RGB matches a source colour and, if that
    /// source spelled out an alpha, its alpha matches exactly. The new alpha
    /// is the destination's alpha (or the pixel's own when the destination
    /// has none) scaled by `alpha`. Other pixels are left untouched.
    pub fn apply(&self, bitmap: &mut RgbaImage, alpha: f32) {
        if self.is_empty() {
            return;
        }

        for pixel in bitmap.pixels_mut() {
            let [r, g, b, a] = pixel.0;
            let Some(replacement) = self.lookup([r, g, b]) else {
                continue;
            };
            if replacement.source.a.is_some_and(|required| required != a) {
                continue;
            }

            let base_alpha = replacement.dest.a.unwrap_or(a);
            let [dr, dg, db] = replacement.dest.to_rgb();
            *pixel = Rgba([dr, dg, db, scale_alpha(base_alpha, alpha)]);
        }
    }
}

/// `round(alpha * factor)`, ties to even, clamped to a byte.
fn scale_alpha(alpha: u8, factor: f32) -> u8 {
    (f64::from(alpha) * f64::from(factor))
        .round_ties_even()
        .clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> OrderedMap<String> {
        entries.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    fn one_pixel(rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(1, 1, Rgba(rgba))
    }

    #[test]
    fn test_build_intersects_names() {
        let theme = table(&[("face", "#00FF00"), ("rim", "#0000FF")]);
        let colours = table(&[("face", "#FF00FF"), ("shadow", "#000000")]);

        let map = ColourMap::build(&theme, &colours).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup([255, 0, 255]).unwrap().dest, Colour::rgb(0, 255, 0));
    }

    #[test]
    fn test_build_rejects_bad_hex() {
        let theme = table(&[("face", "#nothex")]);
        let colours = table(&[("face", "#FF00FF")]);
        assert!(ColourMap::build(&theme, &colours).is_err());
    }

    #[test]
    fn test_later_entry_with_same_rgb_wins() {
        let mut map = ColourMap::new();
        map.insert(Colour::rgb(1, 1, 1), Colour::rgb(2, 2, 2));
        map.insert(Colour::new(1, 1, 1, 255), Colour::rgb(3, 3, 3));
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup([1, 1, 1]).unwrap().dest, Colour::rgb(3, 3, 3));
    }

    #[test]
    fn test_source_without_alpha_matches_any_alpha() {
        let mut map = ColourMap::new();
        map.insert(Colour::rgb(255, 0, 255), Colour::rgb(0, 255, 0));

        let mut opaque = one_pixel([255, 0, 255, 255]);
        map.apply(&mut opaque, 1.0);
        assert_eq!(opaque.get_pixel(0, 0).0, [0, 255, 0, 255]);

        let mut faint = one_pixel([255, 0, 255, 100]);
        map.apply(&mut faint, 0.5);
        assert_eq!(faint.get_pixel(0, 0).0, [0, 255, 0, 50]);
    }

    #[test]
    fn test_source_alpha_gates_replacement() {
        let mut map = ColourMap::new();
        map.insert(Colour::new(255, 0, 255, 255), Colour::rgb(0, 255, 0));

        let mut opaque = one_pixel([255, 0, 255, 255]);
        map.apply(&mut opaque, 1.0);
        assert_eq!(opaque.get_pixel(0, 0).0, [0, 255, 0, 255]);

        let mut half = one_pixel([255, 0, 255, 128]);
        map.apply(&mut half, 1.0);
        assert_eq!(half.get_pixel(0, 0).0, [255, 0, 255, 128]);
    }

    #[test]
    fn test_destination_alpha_is_scaled() {
        let mut map = ColourMap::new();
        map.insert(Colour::rgb(10, 20, 30), Colour::new(40, 50, 60, 200));

        let mut img = one_pixel([10, 20, 30, 255]);
        map.apply(&mut img, 0.5);
        assert_eq!(img.get_pixel(0, 0).0, [40, 50, 60, 100]);
    }

    #[test]
    fn test_unmatched_pixels_pass_through() {
        let mut map = ColourMap::new();
        map.insert(Colour::rgb(255, 0, 255), Colour::rgb(0, 255, 0));

        let mut img = one_pixel([1, 2, 3, 200]);
        map.apply(&mut img, 0.25);
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 200]);
    }

    #[test]
    fn test_scale_alpha_rounds_half_to_even() {
        assert_eq!(scale_alpha(1, 0.5), 0);
        assert_eq!(scale_alpha(3, 0.5), 2);
        assert_eq!(scale_alpha(255, 1.0), 255);
        assert_eq!(scale_alpha(255, 2.0), 255);
    }
}
