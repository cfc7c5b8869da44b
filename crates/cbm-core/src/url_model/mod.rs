//! Destination naming for downloaded resources and per-item directories.
//!
//! Names come from the resource's suggested stem, else the URL path, and are
//! sanitized for Linux filesystems and bounded in length.

mod path;
mod sanitize;

use std::collections::HashSet;

use crate::catalog::{CatalogItem, ResourceLocation};

pub use path::stem_from_url_path;
pub use sanitize::{sanitize_component, truncate_on_char_boundary, NAME_MAX};

/// Stem used when neither the hint nor the URL yields anything usable.
const DEFAULT_STEM: &str = "resource";

/// How destination filenames are built.
#[derive(Debug, Clone)]
pub struct NamingRules {
    /// Fixed extension, without the leading dot.
    pub extension: String,
    pub max_stem_len: usize,
}

impl NamingRules {
    pub fn new(extension: impl Into<String>, max_stem_len: usize) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_string(),
            max_stem_len: max_stem_len.max(1),
        }
    }

    /// `<sanitized stem>.<extension>` for one location.
    pub fn file_name(&self, location: &ResourceLocation) -> String {
        let raw = location
            .suggested_stem
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| stem_from_url_path(&location.url))
            .unwrap_or_else(|| DEFAULT_STEM.to_string());
        let room = self
            .max_stem_len
            .min(NAME_MAX.saturating_sub(self.extension.len() + 1));
        let mut stem = sanitize_component(&raw, room);
        if stem.is_empty() {
            stem = DEFAULT_STEM.to_string();
        }
        self.join(&stem)
    }

    /// File names for a whole item, made unique by `-2`, `-3`... suffixes in
    /// input order.
    pub fn plan(&self, locations: &[ResourceLocation]) -> Vec<String> {
        let mut taken = HashSet::new();
        locations
            .iter()
            .map(|loc| {
                let name = self.file_name(loc);
                if taken.insert(name.clone()) {
                    return name;
                }
                let stem = name
                    .strip_suffix(&format!(".{}", self.extension))
                    .unwrap_or(&name)
                    .to_string();
                let mut n = 2;
                loop {
                    let candidate = self.join(&format!("{}-{}", stem, n));
                    if taken.insert(candidate.clone()) {
                        return candidate;
                    }
                    n += 1;
                }
            })
            .collect()
    }

    fn join(&self, stem: &str) -> String {
        if self.extension.is_empty() {
            stem.to_string()
        } else {
            format!("{}.{}", stem, self.extension)
        }
    }
}

/// Directory name for one catalog item: `<title>-<id>`, so items sharing a
/// title never share a directory. The title is shortened to keep the id
/// intact within `max_len`. Falls back to whichever part is non-empty, then
/// to `item-<ordinal>`.
pub fn item_dir_name(item: &CatalogItem, max_len: usize) -> String {
    let max_len = max_len.min(NAME_MAX);
    let id = sanitize_component(&item.id, max_len);
    if id.is_empty() {
        let title = sanitize_component(&item.title, max_len);
        if title.is_empty() {
            return format!("item-{}", item.ordinal);
        }
        return title;
    }
    let room = max_len.saturating_sub(id.len() + 1);
    let title = sanitize_component(&item.title, room);
    if title.is_empty() {
        return id;
    }
    format!("{}-{}", title, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> NamingRules {
        NamingRules::new("mp3", 60)
    }

    #[test]
    fn file_name_prefers_suggested_stem() {
        let loc = ResourceLocation::with_stem("https://cdn.example.com/x/abc123.m4a", "Lesson 1: Intro");
        assert_eq!(rules().file_name(&loc), "Lesson_1_Intro.mp3");
    }

    #[test]
    fn file_name_from_url_path() {
        let loc = ResourceLocation::new("https://cdn.example.com/audio/track-07.m4a?sig=zz");
        assert_eq!(rules().file_name(&loc), "track-07.mp3");
    }

    #[test]
    fn file_name_fallback() {
        let loc = ResourceLocation::new("https://cdn.example.com/");
        assert_eq!(rules().file_name(&loc), "resource.mp3");
    }

    #[test]
    fn stem_is_bounded() {
        let long = "a".repeat(200);
        let loc = ResourceLocation::with_stem("https://x/y", long);
        let name = NamingRules::new(".mp3", 60).file_name(&loc);
        assert_eq!(name.len(), 60 + ".mp3".len());
    }

    #[test]
    fn plan_makes_names_unique() {
        let locs = vec![
            ResourceLocation::new("https://a/one/track.mp3"),
            ResourceLocation::new("https://a/two/track.mp3"),
            ResourceLocation::new("https://a/three/track.mp3"),
        ];
        assert_eq!(
            rules().plan(&locs),
            vec!["track.mp3", "track-2.mp3", "track-3.mp3"]
        );
    }

    #[test]
    fn item_dir_joins_title_and_id() {
        let titled = CatalogItem::new("c-1", "Deep Work / Part 1", 1);
        assert_eq!(item_dir_name(&titled, 80), "Deep_Work_Part_1-c-1");
        let untitled = CatalogItem::new("c-2", "...", 2);
        assert_eq!(item_dir_name(&untitled, 80), "c-2");
        let no_id = CatalogItem::new("", "Orphan", 3);
        assert_eq!(item_dir_name(&no_id, 80), "Orphan");
        let blank = CatalogItem::new("", "", 4);
        assert_eq!(item_dir_name(&blank, 80), "item-4");
    }

    #[test]
    fn same_title_items_get_distinct_dirs() {
        let a = CatalogItem::new("101", "Morning Meditation", 1);
        let b = CatalogItem::new("102", "Morning Meditation", 2);
        assert_ne!(item_dir_name(&a, 80), item_dir_name(&b, 80));
    }

    #[test]
    fn long_title_is_cut_before_the_id() {
        let item = CatalogItem::new("course-42", "x".repeat(100), 1);
        let name = item_dir_name(&item, 30);
        assert_eq!(name.len(), 30);
        assert!(name.ends_with("-course-42"));

        let huge_id = CatalogItem::new("i".repeat(40), "Title", 2);
        assert_eq!(item_dir_name(&huge_id, 30), "i".repeat(30));
    }
}
