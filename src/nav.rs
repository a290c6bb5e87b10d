//! Selection, type-ahead and hit-testing.
//!
//! All functions here are pure over a [`Menu`] snapshot except
//! [`scroll`], which adjusts the scroll window in place. The dispatcher
//! owns the notion of the "active" menu and applies the returned
//! selection.

use bitflags::bitflags;

use crate::layout::{rows, Row};
use crate::tree::{Menu, MenuId};

bitflags! {
    /// Work to perform after an event transition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Action: u8 {
        /// Reset the type-ahead buffer.
        const CLEAR = 1 << 0;
        /// Re-place and re-show the active menu chain.
        const MAP = 1 << 1;
        /// Redraw the active menu.
        const DRAW = 1 << 2;
        /// Report the selection midpoint as the pointer focus target.
        const WARP = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDir {
    Prev,
    Next,
    First,
    Last,
}

/// Result of hit-testing a surface-relative y coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    None,
    Item(usize),
    ScrollUp,
    ScrollDown,
}

/// What activating an item does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation<T> {
    /// Separators do not react.
    Ignored,
    /// Open and focus this submenu.
    Descend(MenuId),
    /// A leaf was chosen; the run ends with its output.
    Finish(T),
}

/// Where Escape leads from a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Return focus to the caller.
    Caller(MenuId),
    /// Nothing above; the whole menu run is dismissed.
    Dismiss,
}

/// Decide what activating `items[idx]` of `menu` does.
pub fn activate<T: Clone>(menu: &Menu<T>, idx: usize) -> Activation<T> {
    let item = &menu.items[idx];
    if item.is_separator() {
        Activation::Ignored
    } else if let Some(sub) = item.submenu {
        Activation::Descend(sub)
    } else {
        Activation::Finish(item.output.clone())
    }
}

/// Escape target for `menu`: its caller, or dismissal on the root.
pub fn fallback<T>(menu: &Menu<T>) -> Fallback {
    match menu.caller {
        Some(id) => Fallback::Caller(id),
        None => Fallback::Dismiss,
    }
}

/// Next selection for a keyboard step. `Next`/`Prev` stop at the ends
/// without wrapping; `First`/`Last` skip leading/trailing separators,
/// falling back to the raw end if the whole menu is separators.
/// Single steps do not skip separators, matching the menu's visible
/// stepping order.
pub fn cycle<T>(menu: &Menu<T>, dir: CycleDir) -> Option<usize> {
    let len = menu.items.len();
    if len == 0 {
        return None;
    }
    let last = len - 1;
    match dir {
        CycleDir::Next => match menu.selected {
            None => Some(0),
            Some(i) if i < last => Some(i + 1),
            Some(i) => Some(i),
        },
        CycleDir::Prev => match menu.selected {
            None => Some(last),
            Some(0) => Some(0),
            Some(i) => Some(i - 1),
        },
        CycleDir::First => {
            let found = (0..len).find(|&i| !menu.items[i].is_separator());
            Some(found.unwrap_or(0))
        }
        CycleDir::Last => {
            let found = (0..len).rev().find(|&i| !menu.items[i].is_separator());
            Some(found.unwrap_or(last))
        }
    }
}

/// Incremental type-ahead: find an item whose label starts with `prefix`,
/// scanning forward (`dir > 0`), backward (`dir < 0`) from the current
/// selection, or from the top (`dir == 0`). Wraps around once.
pub fn match_item<T>(menu: &Menu<T>, prefix: &str, dir: i32) -> Option<usize> {
    let len = menu.items.len();
    if len == 0 || prefix.is_empty() {
        return None;
    }

    let matches = |i: usize| {
        let label = &menu.items[i].label;
        !label.is_empty() && label.starts_with(prefix)
    };

    let (start, step): (usize, i32) = if dir < 0 {
        let start = match menu.selected {
            Some(sel) if sel > 0 => sel - 1,
            _ => len - 1,
        };
        (start, -1)
    } else if dir > 0 {
        let start = match menu.selected {
            Some(sel) if sel < len - 1 => sel + 1,
            _ => 0,
        };
        (start, 1)
    } else {
        (0, 1)
    };

    let scan = |mut i: i32| -> Option<usize> {
        while i >= 0 && (i as usize) < len {
            if matches(i as usize) {
                return Some(i as usize);
            }
            i += step;
        }
        None
    };

    scan(start as i32).or_else(|| {
        // second pass from the boundary
        let from = if step > 0 { 0 } else { len as i32 - 1 };
        scan(from)
    })
}

/// Hit-test a surface-relative y coordinate against the visible rows,
/// scroll indicators included.
pub fn hit_test<T>(menu: &Menu<T>, target: i32, border: i32) -> Hit {
    let mut y = border;
    for (row, h) in rows(menu, true) {
        if y <= target && target < y + h {
            return match row {
                Row::ScrollUp => Hit::ScrollUp,
                Row::ScrollDown => Hit::ScrollDown,
                Row::Item(i) => Hit::Item(i),
            };
        }
        y += h;
    }
    Hit::None
}

/// Shift the scroll window by `delta` rows, clamped. No-op when the menu
/// does not overflow.
pub fn scroll<T>(menu: &mut Menu<T>, delta: i32) {
    if menu.overflow.is_none() {
        return;
    }
    let first = (menu.first as i32 + delta).clamp(0, menu.max_first() as i32);
    menu.first = first as usize;
}

/// On-screen midpoint of the current selection, if it is visible. Used to
/// warp pointer focus after a keyboard-driven selection change.
pub fn selection_point<T>(menu: &Menu<T>, border: i32) -> Option<(i32, i32)> {
    let (mx, my) = menu.position?;
    let selected = menu.selected?;
    let mut y = border;
    for (row, h) in rows(menu, true) {
        if row == Row::Item(selected) {
            return Some((mx + menu.width / 2, my + y + h / 2));
        }
        y += h;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::layout::{place, Rect};
    use crate::tree::tests::build;
    use crate::tree::{MenuId, MenuTree};

    fn menu(labels: &[&str]) -> MenuTree<String> {
        let lines: Vec<(&str, usize)> = labels.iter().map(|&l| (l, 0)).collect();
        build(&lines)
    }

    #[test]
    fn test_cycle_next_stops_at_end() {
        let tree = menu(&["a", "b", "c"]);
        let m = tree.menu(MenuId::ROOT);
        assert_eq!(cycle(m, CycleDir::Next), Some(0));

        let mut tree = tree;
        tree.menu_mut(MenuId::ROOT).selected = Some(2);
        assert_eq!(cycle(tree.menu(MenuId::ROOT), CycleDir::Next), Some(2));
    }

    #[test]
    fn test_cycle_prev_from_none_lands_on_last() {
        let tree = menu(&["a", "b", "c"]);
        assert_eq!(cycle(tree.menu(MenuId::ROOT), CycleDir::Prev), Some(2));
    }

    #[test]
    fn test_cycle_first_skips_leading_separator() {
        let tree = menu(&["", "a", "b"]);
        assert_eq!(cycle(tree.menu(MenuId::ROOT), CycleDir::First), Some(1));
    }

    #[test]
    fn test_cycle_last_skips_trailing_separator() {
        let tree = menu(&["a", "b", ""]);
        assert_eq!(cycle(tree.menu(MenuId::ROOT), CycleDir::Last), Some(1));
    }

    #[test]
    fn test_cycle_all_separators_falls_back() {
        let tree = menu(&["", ""]);
        assert_eq!(cycle(tree.menu(MenuId::ROOT), CycleDir::First), Some(0));
        assert_eq!(cycle(tree.menu(MenuId::ROOT), CycleDir::Last), Some(1));
    }

    #[test]
    fn test_cycle_single_step_can_land_on_separator() {
        // known quirk: only First/Last skip separators
        let mut tree = menu(&["a", "", "b"]);
        tree.menu_mut(MenuId::ROOT).selected = Some(0);
        assert_eq!(cycle(tree.menu(MenuId::ROOT), CycleDir::Next), Some(1));
    }

    #[test]
    fn test_cycle_empty_menu() {
        let config = Config::default();
        let tree: MenuTree<String> = MenuTree::new(&config);
        assert_eq!(cycle(tree.menu(MenuId::ROOT), CycleDir::Next), None);
    }

    #[test]
    fn test_match_prefix_forward_and_wrap() {
        let mut tree = menu(&["alpha", "beta", "bravo"]);
        assert_eq!(match_item(tree.menu(MenuId::ROOT), "b", 0), Some(1));

        tree.menu_mut(MenuId::ROOT).selected = Some(1);
        assert_eq!(match_item(tree.menu(MenuId::ROOT), "b", 1), Some(2));

        tree.menu_mut(MenuId::ROOT).selected = Some(2);
        // wraps back around to the first match
        assert_eq!(match_item(tree.menu(MenuId::ROOT), "b", 1), Some(1));
    }

    #[test]
    fn test_match_backward() {
        let mut tree = menu(&["alpha", "beta", "bravo"]);
        tree.menu_mut(MenuId::ROOT).selected = Some(2);
        assert_eq!(match_item(tree.menu(MenuId::ROOT), "b", -1), Some(1));
    }

    #[test]
    fn test_match_never_selects_separator() {
        let tree = menu(&["", "real"]);
        for prefix in ["r", "re", "x"] {
            let hit = match_item(tree.menu(MenuId::ROOT), prefix, 0);
            assert_ne!(hit, Some(0), "separator matched prefix {prefix:?}");
        }
        assert_eq!(match_item(tree.menu(MenuId::ROOT), "r", 0), Some(1));
        assert_eq!(match_item(tree.menu(MenuId::ROOT), "", 0), None);
    }

    #[test]
    fn test_hit_test_rows_and_bounds() {
        let mut tree = menu(&["a", "b"]);
        let config = Config::default();
        place(&mut tree, MenuId::ROOT, None, &config, Rect::new(0, 0, 1920, 1080));
        let m = tree.menu(MenuId::ROOT);
        let border = config.border_size;

        assert_eq!(hit_test(m, border, border), Hit::Item(0));
        assert_eq!(hit_test(m, border + 20, border), Hit::Item(1));
        assert_eq!(hit_test(m, -1, border), Hit::None);
        assert_eq!(hit_test(m, m.height + 5, border), Hit::None);
    }

    #[test]
    fn test_hit_test_scroll_indicators() {
        let mut tree = menu(&["a", "b", "c"]);
        let config = Config {
            border_size: 0,
            ..Config::default()
        };
        place(&mut tree, MenuId::ROOT, None, &config, Rect::new(0, 0, 1920, 50));
        let m = tree.menu(MenuId::ROOT);
        assert_eq!(m.overflow, Some(1));
        // rows: up 0..12, item 12..32, down 32..44
        assert_eq!(hit_test(m, 5, 0), Hit::ScrollUp);
        assert_eq!(hit_test(m, 20, 0), Hit::Item(0));
        assert_eq!(hit_test(m, 40, 0), Hit::ScrollDown);
    }

    #[test]
    fn test_activate_separator_is_inert() {
        let tree = menu(&["a", "", "b"]);
        let m = tree.menu(MenuId::ROOT);
        assert_eq!(activate(m, 1), Activation::Ignored);
        assert_eq!(activate(m, 0), Activation::Finish("a".to_string()));
    }

    #[test]
    fn test_activate_descends_into_submenu() {
        let tree = build(&[("Edit", 0), ("Cut", 1)]);
        let root = tree.menu(MenuId::ROOT);
        let sub = root.items[0].submenu.unwrap();
        assert_eq!(activate(root, 0), Activation::Descend(sub));
    }

    #[test]
    fn test_fallback_walks_toward_root() {
        let mut tree = build(&[("Edit", 0), ("Cut", 1)]);
        let sub = tree.menu(MenuId::ROOT).items[0].submenu.unwrap();
        tree.menu_mut(sub).caller = Some(MenuId::ROOT);

        assert_eq!(fallback(tree.menu(sub)), Fallback::Caller(MenuId::ROOT));
        assert_eq!(fallback(tree.menu(MenuId::ROOT)), Fallback::Dismiss);
    }

    #[test]
    fn test_hit_test_follows_scroll_window() {
        let mut tree = menu(&["a", "b", "c"]);
        let config = Config {
            border_size: 0,
            ..Config::default()
        };
        place(&mut tree, MenuId::ROOT, None, &config, Rect::new(0, 0, 1920, 50));
        assert_eq!(hit_test(tree.menu(MenuId::ROOT), 20, 0), Hit::Item(0));

        // after a scroll the same y resolves to the newly visible item,
        // so the frame on screen must be repainted alongside
        scroll(tree.menu_mut(MenuId::ROOT), 1);
        assert_eq!(hit_test(tree.menu(MenuId::ROOT), 20, 0), Hit::Item(1));
    }

    #[test]
    fn test_scroll_clamps_to_window() {
        let mut tree = menu(&["a", "b", "c"]);
        let config = Config {
            border_size: 0,
            ..Config::default()
        };
        place(&mut tree, MenuId::ROOT, None, &config, Rect::new(0, 0, 1920, 50));
        let m = tree.menu_mut(MenuId::ROOT);

        scroll(m, -1);
        assert_eq!(m.first, 0);
        scroll(m, 1);
        assert_eq!(m.first, 1);
        scroll(m, 5);
        assert_eq!(m.first, 2, "first clamps to len - overflow");
    }

    #[test]
    fn test_scroll_ignored_without_overflow() {
        let mut tree = menu(&["a", "b"]);
        scroll(tree.menu_mut(MenuId::ROOT), 1);
        assert_eq!(tree.menu(MenuId::ROOT).first, 0);
    }

    #[test]
    fn test_selection_point_centers_on_item() {
        let mut tree = menu(&["a", "b"]);
        let config = Config::default();
        place(&mut tree, MenuId::ROOT, None, &config, Rect::new(0, 0, 1920, 1080));
        tree.menu_mut(MenuId::ROOT).selected = Some(1);
        let m = tree.menu(MenuId::ROOT);
        let (x, y) = selection_point(m, config.border_size).unwrap();
        assert_eq!(x, m.width / 2);
        assert_eq!(y, config.border_size + 20 + 10);
    }
}
