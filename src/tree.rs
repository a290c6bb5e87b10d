//! The menu tree.
//!
//! Menus live in an arena owned by [`MenuTree`] and are addressed by
//! [`MenuId`]. An item's `submenu` link and a menu's `caller` back-link
//! are both plain ids: ownership is strictly the arena's, and `caller`
//! is only ever used to walk back towards the root, never to free
//! anything.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use thiserror::Error;

use crate::config::Config;
use crate::draw::{AlphaMask, ARROW_H};
use crate::surface::MenuSurface;
use crate::text::TextShaper;

/// Width added to an item when it gains a submenu indicator.
pub const SUBMENU_ARROW_W: i32 = ARROW_H;

#[derive(Debug, Error)]
pub enum TreeError {
    /// `depth` skipped past the end of the existing submenu chain.
    #[error("too much depth")]
    TooDeep,
    /// Icon decode or resize failure; fatal at construction time.
    #[error("failed to load icon: {0}")]
    Icon(#[from] image::ImageError),
}

/// Index of a menu inside the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuId(pub(crate) usize);

impl MenuId {
    pub const ROOT: MenuId = MenuId(0);
}

/// One entry of a menu. Immutable after creation except for the lazily
/// created submenu link and the cached label raster.
pub struct Item<T> {
    pub label: String,
    pub output: T,
    pub icon: Option<RgbaImage>,
    pub submenu: Option<MenuId>,
    pub width: i32,
    pub height: i32,
    /// Rendered label, cached on first draw.
    pub label_mask: Option<AlphaMask>,
}

impl<T> Item<T> {
    /// Separators have an empty label; they are never selectable, never
    /// matched by type-ahead and never own a submenu.
    pub fn is_separator(&self) -> bool {
        self.label.is_empty()
    }
}

/// A menu- or submenu-window.
pub struct Menu<T> {
    pub items: Vec<Item<T>>,
    /// Index of the first visible item when scrolled.
    pub first: usize,
    /// Currently selected item, if any.
    pub selected: Option<usize>,
    /// `Some(n)` when scrolling: n items fit the visible window and
    /// `items[first..first + n]` is shown.
    pub overflow: Option<usize>,
    /// Menu position on screen once placed.
    pub position: Option<(i32, i32)>,
    pub width: i32,
    pub height: i32,
    /// The menu that most recently displayed this one; `None` for the root.
    pub caller: Option<MenuId>,
    /// Geometry must be recomputed before the next show.
    pub dirty: bool,
    /// Height of each synthesized scroll-indicator row.
    pub indicator_h: i32,
    pub surface: MenuSurface,
}

impl<T> Menu<T> {
    fn new(config: &Config) -> Self {
        Self {
            items: Vec::new(),
            first: 0,
            selected: None,
            overflow: None,
            position: None,
            width: 0,
            height: 0,
            caller: None,
            dirty: true,
            indicator_h: crate::draw::ARROW_H + config.padding_y * 2,
            surface: MenuSurface::new(),
        }
    }

    /// Range of item indices currently visible.
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        match self.overflow {
            Some(n) => self.first..(self.first + n).min(self.items.len()),
            None => 0..self.items.len(),
        }
    }

    /// Upper bound for `first` when scrolled.
    pub fn max_first(&self) -> usize {
        match self.overflow {
            Some(n) => self.items.len().saturating_sub(n),
            None => 0,
        }
    }
}

/// Arena of menus; `MenuId::ROOT` is created up front.
pub struct MenuTree<T> {
    menus: Vec<Menu<T>>,
}

impl<T> MenuTree<T> {
    pub fn new(config: &Config) -> Self {
        Self {
            menus: vec![Menu::new(config)],
        }
    }

    pub fn menu(&self, id: MenuId) -> &Menu<T> {
        &self.menus[id.0]
    }

    pub fn menu_mut(&mut self, id: MenuId) -> &mut Menu<T> {
        &mut self.menus[id.0]
    }

    /// Iterate every menu id in the arena.
    pub fn ids(&self) -> impl Iterator<Item = MenuId> {
        (0..self.menus.len()).map(MenuId)
    }

    fn make_menu(&mut self, config: &Config) -> MenuId {
        self.menus.push(Menu::new(config));
        MenuId(self.menus.len() - 1)
    }

    /// Append an item `depth` levels down the rightmost submenu chain of
    /// `menu`, creating the final submenu on the way if it does not exist
    /// yet. Fails with [`TreeError::TooDeep`] when `depth` skips a level;
    /// the tree is left untouched on failure.
    pub fn append(
        &mut self,
        menu: MenuId,
        label: &str,
        output: T,
        icon: Option<&Path>,
        depth: usize,
        config: &Config,
        text: &dyn TextShaper,
    ) -> Result<(), TreeError> {
        // validate the whole walk before mutating anything
        let mut walk = menu;
        for level in 0..depth {
            let tail = self.menus[walk.0].items.last().ok_or(TreeError::TooDeep)?;
            match tail.submenu {
                Some(sub) => walk = sub,
                // the missing link may only be the final one; it gets created below
                None if level + 1 == depth => break,
                None => return Err(TreeError::TooDeep),
            }
        }

        let mut cur = menu;
        for _ in 0..depth {
            let tail_idx = self.menus[cur.0].items.len() - 1;
            cur = match self.menus[cur.0].items[tail_idx].submenu {
                Some(sub) => sub,
                None => {
                    let sub = self.make_menu(config);
                    self.set_submenu(cur, tail_idx, sub);
                    sub
                }
            };
        }

        let item = make_item(label, output, icon, config, text)?;
        let menu = &mut self.menus[cur.0];
        menu.items.push(item);
        menu.dirty = true;
        Ok(())
    }

    /// Link `sub` under `items[item_idx]` of `menu`, widening the item by
    /// the submenu indicator and propagating the width to the menu.
    fn set_submenu(&mut self, menu: MenuId, item_idx: usize, sub: MenuId) {
        let m = &mut self.menus[menu.0];
        let item = &mut m.items[item_idx];
        item.width += SUBMENU_ARROW_W;
        item.submenu = Some(sub);
        m.width = m.width.max(item.width);
    }

    /// Hide every descendant submenu of `menu` except the chain through
    /// `except`, tearing down their surfaces.
    pub fn hide_children(&mut self, menu: MenuId, except: Option<MenuId>) {
        let subs: Vec<MenuId> = self.menus[menu.0]
            .items
            .iter()
            .filter_map(|item| item.submenu)
            .filter(|&sub| Some(sub) != except)
            .collect();
        for sub in subs {
            self.hide(sub);
        }
    }

    /// Hide `menu` and everything below it.
    pub fn hide(&mut self, menu: MenuId) {
        self.hide_children(menu, None);
        self.menus[menu.0].surface.hide();
    }
}

/// Compute an item's geometry and load its icon.
fn make_item<T>(
    label: &str,
    output: T,
    icon: Option<&Path>,
    config: &Config,
    text: &dyn TextShaper,
) -> Result<Item<T>, TreeError> {
    let mut item = Item {
        label: label.to_string(),
        output,
        icon: None,
        submenu: None,
        width: config.padding_x * 2,
        height: 0,
        label_mask: None,
    };

    if item.is_separator() {
        item.height = 1 + config.padding_y * 2;
        return Ok(item);
    }

    item.width += text.measure(label);
    item.height = text.line_height() + config.padding_y * 2;

    if let Some(path) = icon {
        if !config.disable_icons {
            let img = image::open(path)?.to_rgba8();
            let size = config.icon_size as u32;
            item.icon = Some(imageops::resize(&img, size, size, FilterType::Triangle));
            item.width += config.icon_size + config.padding_x;
            item.height = item.height.max(config.icon_size + config.padding_y * 2);
        }
    }
    Ok(item)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fixed-advance metrics so tests do not need a font file.
    pub(crate) struct FixedMetrics {
        pub advance: i32,
        pub line: i32,
    }

    impl Default for FixedMetrics {
        fn default() -> Self {
            Self { advance: 8, line: 12 }
        }
    }

    impl TextShaper for FixedMetrics {
        fn measure(&self, text: &str) -> i32 {
            self.advance * text.chars().count() as i32
        }

        fn line_height(&self) -> i32 {
            self.line
        }

        fn render(&self, text: &str) -> AlphaMask {
            AlphaMask::new(self.measure(text), self.line)
        }
    }

    pub(crate) fn build(lines: &[(&str, usize)]) -> MenuTree<String> {
        let config = Config::default();
        let text = FixedMetrics::default();
        let mut tree = MenuTree::new(&config);
        for (label, depth) in lines {
            tree.append(
                MenuId::ROOT,
                label,
                label.to_string(),
                None,
                *depth,
                &config,
                &text,
            )
            .unwrap();
        }
        tree
    }

    #[test]
    fn test_append_builds_submenu_chain() {
        let tree = build(&[("Edit", 0), ("Cut", 1), ("Copy", 1), ("View", 0)]);
        let root = tree.menu(MenuId::ROOT);
        assert_eq!(root.items.len(), 2);
        assert_eq!(root.items[0].label, "Edit");
        assert_eq!(root.items[1].label, "View");

        let sub = root.items[0].submenu.expect("Edit owns a submenu");
        let labels: Vec<_> = tree.menu(sub).items.iter().map(|i| i.label.clone()).collect();
        assert_eq!(labels, ["Cut", "Copy"]);
        assert!(root.items[1].submenu.is_none());
    }

    #[test]
    fn test_append_too_deep_fails_and_leaves_tree_unchanged() {
        let config = Config::default();
        let text = FixedMetrics::default();
        let mut tree: MenuTree<String> = MenuTree::new(&config);
        tree.append(MenuId::ROOT, "a", "a".into(), None, 0, &config, &text)
            .unwrap();

        // depth 2 would skip a level: "a" has no submenu yet
        let err = tree
            .append(MenuId::ROOT, "x", "x".into(), None, 2, &config, &text)
            .unwrap_err();
        assert!(matches!(err, TreeError::TooDeep));

        let root = tree.menu(MenuId::ROOT);
        assert_eq!(root.items.len(), 1);
        assert!(root.items[0].submenu.is_none(), "no submenu may be created");
    }

    #[test]
    fn test_append_into_empty_root_requires_depth_zero() {
        let config = Config::default();
        let text = FixedMetrics::default();
        let mut tree: MenuTree<String> = MenuTree::new(&config);
        let err = tree
            .append(MenuId::ROOT, "x", "x".into(), None, 1, &config, &text)
            .unwrap_err();
        assert!(matches!(err, TreeError::TooDeep));
        assert!(tree.menu(MenuId::ROOT).items.is_empty());
    }

    #[test]
    fn test_item_geometry() {
        let config = Config::default();
        let text = FixedMetrics::default();
        let item = make_item("abc", "abc", None, &config, &text).unwrap();
        assert_eq!(item.width, config.padding_x * 2 + 3 * 8);
        assert_eq!(item.height, 12 + config.padding_y * 2);

        let sep = make_item("", "", None, &config, &text).unwrap();
        assert!(sep.is_separator());
        assert_eq!(sep.width, config.padding_x * 2);
        assert_eq!(sep.height, 1 + config.padding_y * 2);
    }

    #[test]
    fn test_icon_widens_and_raises_item() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([0xFF, 0, 0, 0xFF]))
            .save(&path)
            .unwrap();

        let config = Config::default();
        let text = FixedMetrics::default();
        let item = make_item("a", "a", Some(&path), &config, &text).unwrap();
        let icon = item.icon.as_ref().expect("icon decoded");
        assert_eq!(icon.dimensions(), (24, 24));
        assert_eq!(
            item.width,
            config.padding_x * 2 + 8 + config.icon_size + config.padding_x
        );
        assert_eq!(item.height, config.icon_size + config.padding_y * 2);
    }

    #[test]
    fn test_submenu_link_widens_item() {
        let tree = build(&[("Edit", 0), ("Cut", 1)]);
        let root = tree.menu(MenuId::ROOT);
        let expect = Config::default().padding_x * 2 + 4 * 8 + SUBMENU_ARROW_W;
        assert_eq!(root.items[0].width, expect);
    }
}
