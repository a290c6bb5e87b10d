//! Menu geometry.
//!
//! Sizes and positions are recomputed lazily: appending items marks a menu
//! dirty, and [`place`] recomputes bounds on the next show. When the item
//! stack would not fit the display the menu enters overflow mode: two
//! scroll-indicator rows are reserved and only a window of
//! `overflow` items starting at `first` is shown.

use crate::config::Config;
use crate::tree::{Menu, MenuId, MenuTree};

/// Display bounds in compositor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

/// One visible row of a menu, top to bottom. The scroll indicators are
/// synthesized rows; they have no index into the item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    ScrollUp,
    Item(usize),
    ScrollDown,
}

/// Visible rows with their heights, in display order.
pub fn rows<T>(menu: &Menu<T>, with_indicators: bool) -> Vec<(Row, i32)> {
    let mut out = Vec::new();
    let scrolled = menu.overflow.is_some();
    if scrolled && with_indicators {
        out.push((Row::ScrollUp, menu.indicator_h));
    }
    for i in menu.visible_range() {
        out.push((Row::Item(i), menu.items[i].height));
    }
    if scrolled && with_indicators {
        out.push((Row::ScrollDown, menu.indicator_h));
    }
    out
}

/// Compute geometry and screen position for `id`, then adopt `caller` as
/// its parent in the display chain. Idempotent for repeated calls with the
/// same caller. Descendant submenus outside the chain are hidden.
pub fn place<T>(
    tree: &mut MenuTree<T>,
    id: MenuId,
    caller: Option<MenuId>,
    config: &Config,
    monitor: Rect,
) {
    // self-referential show = root redisplay
    let caller = caller.filter(|&c| c != id);

    tree.hide_children(id, None);
    if let Some(c) = caller {
        tree.hide_children(c, Some(id));
    }

    if tree.menu(id).dirty {
        recompute(tree.menu_mut(id), config, monitor);
    }

    if let Some(c) = caller {
        // anchoring happens once per adoption; a repeated show from the
        // same caller keeps the position stable
        if tree.menu(id).caller != Some(c) {
            let (cx, cy, cw, offset) = {
                let parent = tree.menu(c);
                let (px, py) = parent.position.unwrap_or((monitor.x, monitor.y));
                let start = if parent.overflow.is_some() { parent.first } else { 0 };
                let sel = parent.selected.unwrap_or(start).max(start);
                let offset: i32 = parent.items[start..sel.min(parent.items.len())]
                    .iter()
                    .map(|item| item.height)
                    .sum();
                (px, py, parent.width, offset)
            };

            let menu = tree.menu_mut(id);
            menu.caller = Some(c);

            let mut x = cx + cw;
            if x < monitor.x {
                x = monitor.x;
            } else if x + menu.width > monitor.right() {
                // flip to the caller's left edge
                x = cx - menu.width;
            }
            let mut y = menu.position.map_or(monitor.y, |(_, y)| y);
            if menu.overflow.is_none() {
                y = cy + offset;
            }
            menu.position = Some((x, y));
        }
    } else if tree.menu(id).position.is_none() {
        let menu = tree.menu_mut(id);
        let y = if menu.overflow.is_none() { config.spawn_y } else { 0 };
        menu.position = Some((config.spawn_x, y));
    }

    clamp(tree.menu_mut(id), monitor);
}

fn recompute<T>(menu: &mut Menu<T>, config: &Config, monitor: Rect) {
    menu.dirty = false;
    menu.width = config.border_size * 2 + config.min_item_width;
    menu.height = config.border_size * 2;
    menu.first = 0;
    menu.overflow = None;

    for item in &menu.items {
        menu.width = menu.width.max(item.width);
        menu.height += item.height;
    }

    if menu.height > monitor.height {
        // reserve both indicator rows, then take items until one no
        // longer fits; that item's index becomes the window size
        menu.height = (menu.indicator_h + config.border_size) * 2;
        for (i, item) in menu.items.iter().enumerate() {
            if item.height + menu.height > monitor.height {
                menu.overflow = Some(i);
                break;
            }
            menu.width = menu.width.max(item.width);
            menu.height += item.height;
        }
    }
}

fn clamp<T>(menu: &mut Menu<T>, monitor: Rect) {
    let (mut x, mut y) = menu.position.unwrap_or((monitor.x, monitor.y));
    if x < monitor.x {
        x = monitor.x;
    } else if x + menu.width > monitor.right() {
        x = monitor.right() - menu.width;
    }
    if y < monitor.y {
        y = monitor.y;
    } else if y + menu.height > monitor.bottom() {
        y = monitor.bottom() - menu.height;
    }
    menu.position = Some((x, y));
}
