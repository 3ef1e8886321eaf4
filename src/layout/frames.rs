//! Frame resolution.
//!
//! Template frames are lists of layer references. Before compositing, each
//! reference is expanded through the input's named frame lists, filtered by
//! group and variant, and its layer name resolved through the group's
//! aliases.

use crate::config::{FrameEntry, FrameLayer, Group, Input, OrderedMap, Reference, CURRENT_VARIANT};
use crate::source::LayerMap;

/// A concrete layer to composite into a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayer {
    pub layer: String,
    pub offset: (i64, i64),
    pub alpha: f32,
}

impl ResolvedLayer {
    fn from_frame_layer(
        layer: &FrameLayer,
        variant: &str,
        references: &OrderedMap<Reference>,
    ) -> Self {
        Self {
            layer: resolve_layer_name(references, &layer.layer, variant),
            offset: (layer.offset[0], layer.offset[1]),
            alpha: layer.alpha,
        }
    }
}

/// Resolve an alias through a group's references.
///
/// A flat alias maps straight to its target; a per-variant table maps by
/// variant and falls back to the alias itself. A target of `*` stands for
/// the variant.
pub fn resolve_reference(references: &OrderedMap<Reference>, name: &str, variant: &str) -> String {
    let target = match references.get(name) {
        Some(Reference::Layer(target)) => target.as_str(),
        Some(Reference::PerVariant(table)) => table.get(variant).map_or(name, String::as_str),
        None => name,
    };

    if target == CURRENT_VARIANT {
        variant.to_string()
    } else {
        target.to_string()
    }
}

/// Layer name of a frame layer: `*` is the variant, anything else goes
/// through the references.
fn resolve_layer_name(references: &OrderedMap<Reference>, layer: &str, variant: &str) -> String {
    if layer == CURRENT_VARIANT {
        variant.to_string()
    } else {
        resolve_reference(references, layer, variant)
    }
}

/// Expand template frames into the layers to composite, per frame.
///
/// Frame count and entry order are preserved. Entries whose `groups` or
/// `variants` filters exclude the current group or variant are dropped.
pub fn resolve_frames(
    group: &str,
    variant: &str,
    frames: &[Vec<FrameEntry>],
    named: &OrderedMap<Vec<FrameLayer>>,
    references: &OrderedMap<Reference>,
) -> Vec<Vec<ResolvedLayer>> {
    let resolve = |layer: &FrameLayer| ResolvedLayer::from_frame_layer(layer, variant, references);

    frames
        .iter()
        .map(|frame| {
            let mut layers = Vec::new();
            for entry in frame {
                match entry {
                    FrameEntry::Named(name) => match named.get(name) {
                        Some(list) => layers.extend(
                            list.iter()
                                .filter(|layer| layer.applies_to(group, variant))
                                .map(resolve),
                        ),
                        None => layers.push(resolve(&FrameLayer::new(name.clone()))),
                    },
                    FrameEntry::Layer(layer) => {
                        if layer.applies_to(group, variant) {
                            layers.push(resolve(layer));
                        }
                    }
                }
            }
            layers
        })
        .collect()
}

/// Variants of a group that can be rendered, in listed order.
///
/// Each listed name is first resolved through the group's `*` reference;
/// skipped variants and variants with no layer are left out.
pub fn eligible_variants(input: &Input, group: &Group, layer_map: &LayerMap) -> Vec<String> {
    group
        .variants
        .iter()
        .map(|listed| resolve_reference(&group.references, CURRENT_VARIANT, listed))
        .filter(|variant| !input.is_skipped(variant) && layer_map.contains(variant))
        .collect()
}
