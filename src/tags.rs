//! Stream tag registry and tag selection.

use crate::legend::LegendEntry;
use crate::palette::{MULTIPLE_TAGS_COLOR, NEUTRAL_EDGE_COLOR, Palette};

use serde::Serialize;
use std::collections::BTreeSet;

/// Synthetic entry standing for edges that carry several selected tags.
pub const MULTIPLE_TAGS: &str = "Multiple tags";

/// Opacity of tagged edges outside the selection.
pub const DIMMED_OPACITY: f64 = 0.2;

/// Tags seen on the current job's edges. Cleared on job change.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "tags")]
pub enum TagSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeStyle {
    pub color: String,
    pub opacity: f64,
}

impl TagRegistry {
    pub fn observe<'a>(&mut self, tags: impl IntoIterator<Item = &'a String>) {
        self.tags.extend(tags.into_iter().cloned());
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Sorted tags plus the "Multiple tags" entry when any tag exists.
    pub fn tags(&self) -> Vec<String> {
        let mut all: Vec<String> = self.tags.iter().cloned().collect();
        if !all.is_empty() {
            all.push(MULTIPLE_TAGS.to_string());
            all.sort();
        }
        all
    }

    /// Tags a user can pick individually.
    pub fn selectable(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    /// Tags in effect for `selection`. An explicit selection keeps only
    /// known tags and falls back to the first one when nothing is left.
    pub fn selected(&self, selection: &TagSelection) -> BTreeSet<String> {
        match selection {
            TagSelection::All => self.tags.clone(),
            TagSelection::Only(picked) => {
                let kept: BTreeSet<String> = picked.intersection(&self.tags).cloned().collect();
                if kept.is_empty() {
                    self.tags.iter().next().cloned().into_iter().collect()
                } else {
                    kept
                }
            }
        }
    }

    /// Colour of one edge on the stream-tags layer.
    pub fn edge_style(
        &self,
        edge_tags: &[String],
        selection: &TagSelection,
        palette: &mut Palette,
    ) -> EdgeStyle {
        if edge_tags.is_empty() {
            return EdgeStyle {
                color: NEUTRAL_EDGE_COLOR.to_string(),
                opacity: 1.0,
            };
        }
        let selected = self.selected(selection);
        let matched: Vec<&String> = edge_tags.iter().filter(|t| selected.contains(*t)).collect();
        match matched.as_slice() {
            [] => EdgeStyle {
                color: NEUTRAL_EDGE_COLOR.to_string(),
                opacity: DIMMED_OPACITY,
            },
            [tag] => EdgeStyle {
                color: palette.tag_color(tag),
                opacity: 1.0,
            },
            _ => EdgeStyle {
                color: MULTIPLE_TAGS_COLOR.to_string(),
                opacity: 1.0,
            },
        }
    }

    /// Legend rows for the stream-tags layer.
    pub fn legend_entries(&self, selection: &TagSelection, palette: &mut Palette) -> Vec<LegendEntry> {
        let selected = self.selected(selection);
        let mut entries: Vec<LegendEntry> = selected
            .iter()
            .map(|t| LegendEntry::new(t.clone(), palette.tag_color(t)))
            .collect();
        if selected.len() > 1 {
            entries.push(LegendEntry::new(MULTIPLE_TAGS, MULTIPLE_TAGS_COLOR));
        }
        entries
    }
}
