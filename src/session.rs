//! The run loop.
//!
//! One [`Session`] owns the wayland connection, the menu tree and all
//! interaction state. Wayland handlers only translate low-level events
//! into the bounded [`EventQueue`]; the loop in [`Session::run`] drains
//! it single-threaded and applies the navigation transitions, so the
//! dismiss timer can never race a pointer re-entry.

use std::time::Duration;

use smithay_client_toolkit::compositor::{CompositorHandler, CompositorState};
use smithay_client_toolkit::output::{OutputHandler, OutputState};
use smithay_client_toolkit::reexports::calloop::timer::{TimeoutAction, Timer};
use smithay_client_toolkit::reexports::calloop::{self, EventLoop, LoopHandle, RegistrationToken};
use smithay_client_toolkit::reexports::calloop_wayland_source::WaylandSource;
use smithay_client_toolkit::registry::{ProvidesRegistryState, RegistryState};
use smithay_client_toolkit::registry_handlers;
use smithay_client_toolkit::seat::keyboard::{KeyEvent, KeyboardHandler, Keysym, Modifiers};
use smithay_client_toolkit::seat::pointer::{PointerEvent, PointerEventKind, PointerHandler};
use smithay_client_toolkit::seat::{Capability, SeatHandler, SeatState};
use smithay_client_toolkit::shm::{Shm, ShmHandler};
use smithay_client_toolkit::{
    delegate_compositor, delegate_keyboard, delegate_output, delegate_pointer, delegate_registry,
    delegate_seat, delegate_shm,
};
use thiserror::Error;
use tracing::{debug, warn};
use wayland_client::globals::registry_queue_init;
use wayland_client::protocol::{wl_buffer, wl_keyboard, wl_output, wl_pointer, wl_seat, wl_shm_pool, wl_surface};
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle};
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1::ZwlrLayerShellV1;
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_surface_v1::{
    self, ZwlrLayerSurfaceV1,
};

use crate::config::{Config, ConfigError, Palette};
use crate::draw::{arrow_down, arrow_right, arrow_up, ARROW_H, ARROW_W};
use crate::event::{Event, EventQueue};
use crate::layout::{self, Rect, Row};
use crate::nav::{self, Action, CycleDir, Hit};
use crate::surface::SurfaceError;
use crate::text::TextShaper;
use crate::tree::{MenuId, MenuTree, SUBMENU_ARROW_W};

const BTN_MIDDLE: u32 = 0x112;

/// How long the pointer may rest outside every menu before dismissal.
const DISMISS_DELAY: Duration = Duration::from_millis(100);

/// Maximum blocking wait per loop turn, so timers stay serviced.
const DISPATCH_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid color configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("wayland connection failed: {0}")]
    Connect(#[from] wayland_client::ConnectError),
    #[error("wayland registry setup failed: {0}")]
    Registry(#[from] wayland_client::globals::GlobalError),
    #[error("required compositor global missing: {0}")]
    Bind(#[from] wayland_client::globals::BindError),
    #[error("event loop failure: {0}")]
    Loop(#[from] calloop::Error),
    #[error("event loop i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("no usable output advertised by the compositor")]
    NoOutput,
}

/// How the menu run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// A leaf item was activated.
    Selected(T),
    /// Escape on the root menu.
    Cancelled,
    /// The surface was closed externally or the pointer abandoned the menu.
    Exited,
}

/// The chosen output is written with a leading tab, terminated by a
/// newline. Cancellation and exit produce no output.
pub fn format_selection(output: &str) -> String {
    format!("\t{output}\n")
}

/// Hover callback invoked with a hovered labeled item's output.
pub type HoverFn<T> = Box<dyn FnMut(&T)>;

pub struct Session<T> {
    registry_state: RegistryState,
    seat_state: SeatState,
    output_state: OutputState,
    compositor: CompositorState,
    shm: Shm,
    layer_shell: ZwlrLayerShellV1,

    keyboard: Option<wl_keyboard::WlKeyboard>,
    pointer: Option<wl_pointer::WlPointer>,
    modifiers: Modifiers,

    loop_handle: LoopHandle<'static, Session<T>>,
    qh: QueueHandle<Session<T>>,
    queue: EventQueue,

    config: Config,
    palette: Palette,
    text: Box<dyn TextShaper>,
    tree: MenuTree<T>,

    monitor: Rect,
    /// Tail of the displayed caller chain; keyboard input goes here.
    active: MenuId,
    /// Last item the pointer hovered, to filter repeated motion.
    hovered: Option<(MenuId, usize)>,
    typeahead: String,
    /// The pointer has been over a menu at least once.
    seen: bool,
    dismiss: Option<RegistrationToken>,
    hover: Option<HoverFn<T>>,
    outcome: Option<Outcome<T>>,
}

impl<T: Clone + 'static> Session<T> {
    /// Show the tree and run until an item is activated or the menu is
    /// dismissed. Consumes the tree; the root is shown at the configured
    /// spawn position.
    pub fn run(
        config: Config,
        text: Box<dyn TextShaper>,
        tree: MenuTree<T>,
        hover: Option<HoverFn<T>>,
    ) -> Result<Outcome<T>, SessionError> {
        let palette = config.palette()?;

        let conn = Connection::connect_to_env()?;
        let (globals, wl_queue) = registry_queue_init::<Session<T>>(&conn)?;
        let qh = wl_queue.handle();

        let mut event_loop: EventLoop<'static, Session<T>> = EventLoop::try_new()?;
        WaylandSource::new(conn.clone(), wl_queue)
            .insert(event_loop.handle())
            .map_err(calloop::Error::from)?;

        let compositor = CompositorState::bind(&globals, &qh)?;
        let shm = Shm::bind(&globals, &qh)?;
        let layer_shell: ZwlrLayerShellV1 = globals.bind(&qh, 1..=4, ())?;

        let mut session = Session {
            registry_state: RegistryState::new(&globals),
            seat_state: SeatState::new(&globals, &qh),
            output_state: OutputState::new(&globals, &qh),
            compositor,
            shm,
            layer_shell,
            keyboard: None,
            pointer: None,
            modifiers: Modifiers::default(),
            loop_handle: event_loop.handle(),
            qh,
            queue: EventQueue::new(),
            config,
            palette,
            text,
            tree,
            monitor: Rect::default(),
            active: MenuId::ROOT,
            hovered: None,
            typeahead: String::new(),
            seen: false,
            dismiss: None,
            hover,
            outcome: None,
        };

        // the registry roundtrip is done; wait for output geometry before
        // the first placement
        for _ in 0..50 {
            session.refresh_monitor();
            if session.monitor.width > 0 {
                break;
            }
            event_loop.dispatch(DISPATCH_TIMEOUT, &mut session)?;
        }
        if session.monitor.width == 0 {
            return Err(SessionError::NoOutput);
        }

        session.show(MenuId::ROOT, None)?;

        loop {
            event_loop.dispatch(DISPATCH_TIMEOUT, &mut session)?;
            session.drain()?;
            if let Some(outcome) = session.outcome.take() {
                session.tree.hide(MenuId::ROOT);
                return Ok(outcome);
            }
        }
    }

    fn refresh_monitor(&mut self) {
        let Some(output) = self.output_state.outputs().next() else {
            return;
        };
        let Some(info) = self.output_state.info(&output) else {
            return;
        };
        let (x, y) = info.logical_position.unwrap_or((0, 0));
        let size = info.logical_size.or_else(|| {
            info.modes
                .iter()
                .find(|mode| mode.current)
                .map(|mode| mode.dimensions)
        });
        if let Some((w, h)) = size {
            if w > 0 && h > 0 {
                self.monitor = Rect::new(x, y, w, h);
            }
        }
    }

    fn menu_for_surface(&self, surface: &wl_surface::WlSurface) -> Option<MenuId> {
        self.tree.ids().find(|&id| {
            self.tree
                .menu(id)
                .surface
                .wl_surface()
                .map(|s| s.id() == surface.id())
                .unwrap_or(false)
        })
    }

    // === Showing and drawing ===

    fn show(&mut self, id: MenuId, caller: Option<MenuId>) -> Result<(), SurfaceError> {
        layout::place(&mut self.tree, id, caller, &self.config, self.monitor);
        let menu = self.tree.menu_mut(id);
        let (width, height) = (menu.width, menu.height);
        let position = menu.position.unwrap_or((0, 0));
        menu.surface.update(
            &self.compositor,
            &self.layer_shell,
            &self.shm,
            &self.qh,
            id,
            width,
            height,
            position,
        )
    }

    fn redraw(&mut self, id: MenuId) {
        let border = self.config.border_size;
        let padding_x = self.config.padding_x;
        let icon_size = self.config.icon_size;
        let separator_inset = border + padding_x + self.config.separator_length;
        let palette = self.palette;

        // rasterize labels outside the canvas borrow
        let menu = self.tree.menu_mut(id);
        for i in menu.visible_range() {
            let item = &mut menu.items[i];
            if item.label_mask.is_none() && !item.is_separator() {
                item.label_mask = Some(self.text.render(&item.label));
            }
        }

        let rows = layout::rows(menu, true);
        let (selected, width) = (menu.selected, menu.width);
        let items = &menu.items;
        let surface = &mut menu.surface;
        let Some(mut canvas) = surface.canvas() else {
            return;
        };

        let mut y = border;
        for (row, h) in rows {
            let is_selected = matches!(row, Row::Item(i) if Some(i) == selected);
            let colors = if is_selected { palette.selected } else { palette.normal };
            canvas.fill_rect(0, y, width, h, colors.background);

            match row {
                Row::ScrollUp | Row::ScrollDown => {
                    let mask = if row == Row::ScrollUp { arrow_up() } else { arrow_down() };
                    let ax = width / 2 - ARROW_W / 2;
                    let ay = y + h / 2 - ARROW_H / 2;
                    canvas.blit_mask(ax, ay, &mask, palette.normal.foreground);
                }
                Row::Item(i) => {
                    let item = &items[i];
                    if item.is_separator() {
                        canvas.fill_rect(
                            separator_inset,
                            y + self.config.padding_y,
                            width - separator_inset * 2,
                            1,
                            palette.separator,
                        );
                    } else {
                        let mut x = border + padding_x;
                        if let Some(icon) = &item.icon {
                            canvas.blit_rgba(x, y + h / 2 - icon_size / 2, icon);
                            x += icon_size + padding_x;
                        }
                        if let Some(mask) = &item.label_mask {
                            canvas.blit_mask(x, y + h / 2 - mask.height / 2, mask, colors.foreground);
                        }
                        if item.submenu.is_some() {
                            let ax = width - SUBMENU_ARROW_W - border - padding_x;
                            let ay = y + h / 2 - ARROW_W / 2;
                            canvas.blit_mask(ax, ay, &arrow_right(), colors.foreground);
                        }
                    }
                }
            }
            y += h;
        }
        canvas.frame(border, palette.border);
        drop(canvas);

        surface.publish(&self.qh, id);
    }

    // === Event transitions ===

    fn drain(&mut self) -> Result<(), SurfaceError> {
        while let Some(event) = self.queue.pop() {
            if self.outcome.is_some() {
                break;
            }
            self.handle_event(event)?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<(), SurfaceError> {
        let mut action = Action::empty();
        match event {
            Event::Configured { menu } => {
                self.tree.menu_mut(menu).surface.configured = true;
                self.redraw(menu);
            }
            Event::Closed { menu } => {
                debug!(?menu, "layer surface closed by compositor");
                self.outcome = Some(Outcome::Exited);
            }
            Event::BufferReleased { menu } => {
                if self.tree.menu_mut(menu).surface.on_release() {
                    self.redraw(menu);
                }
            }
            Event::PointerEnter { menu, y } => {
                self.cancel_dismiss();
                self.pointer_motion(menu, y, &mut action)?;
                action |= Action::DRAW;
            }
            Event::PointerLeave { .. } => {
                if self.seen {
                    self.arm_dismiss();
                }
                action = Action::DRAW;
            }
            Event::PointerMotion { menu, y } => self.pointer_motion(menu, y, &mut action)?,
            Event::Button { menu, button, y } => self.button(menu, button, y, &mut action)?,
            Event::Axis { menu: _, delta } => {
                let active = self.active;
                if self.tree.menu(active).overflow.is_some() {
                    nav::scroll(self.tree.menu_mut(active), if delta > 0.0 { 1 } else { -1 });
                    action = Action::CLEAR | Action::MAP | Action::DRAW;
                }
            }
            Event::Key { keysym, utf8, shift } => self.key(keysym, utf8, shift, &mut action)?,
            Event::DismissExpired => {
                self.outcome = Some(Outcome::Exited);
            }
        }
        self.apply(action)
    }

    fn pointer_motion(&mut self, menu: MenuId, y: f64, action: &mut Action) -> Result<(), SurfaceError> {
        let border = self.config.border_size;
        let Hit::Item(idx) = nav::hit_test(self.tree.menu(menu), y as i32, border) else {
            return Ok(());
        };
        if self.hovered == Some((menu, idx)) {
            return Ok(());
        }
        self.seen = true;
        self.hovered = Some((menu, idx));

        let (is_separator, submenu, output) = {
            let item = &self.tree.menu(menu).items[idx];
            (item.is_separator(), item.submenu, item.output.clone())
        };

        self.tree.menu_mut(menu).selected = if is_separator { None } else { Some(idx) };
        self.redraw(menu);

        self.active = match submenu {
            Some(sub) => {
                self.tree.menu_mut(sub).selected = None;
                sub
            }
            None => menu,
        };
        self.show(self.active, Some(menu))?;

        if !is_separator {
            if let Some(hover) = &mut self.hover {
                hover(&output);
            }
        }
        *action = Action::CLEAR | Action::MAP | Action::DRAW;
        Ok(())
    }

    fn button(&mut self, menu: MenuId, button: u32, y: f64, action: &mut Action) -> Result<(), SurfaceError> {
        let border = self.config.border_size;
        let hit = nav::hit_test(self.tree.menu(menu), y as i32, border);
        match hit {
            Hit::None => {
                let active = self.active;
                self.tree.menu_mut(active).selected = None;
                self.tree.menu_mut(menu).first = 0;
                // the clicked menu may not be the active one; its rows
                // changed, so repaint it here rather than rely on the
                // active-menu redraw
                if menu != active {
                    self.redraw(menu);
                }
                *action = Action::CLEAR | Action::MAP | Action::DRAW;
            }
            Hit::ScrollUp | Hit::ScrollDown => {
                let delta = if hit == Hit::ScrollUp { -1 } else { 1 };
                nav::scroll(self.tree.menu_mut(menu), delta);
                if menu != self.active {
                    self.redraw(menu);
                }
                *action = Action::CLEAR | Action::MAP | Action::DRAW;
            }
            Hit::Item(idx) => {
                self.activate(menu, idx, button == BTN_MIDDLE, action)?;
            }
        }
        Ok(())
    }

    /// Activate `items[idx]` of `menu`: descend into its submenu or
    /// finish with its output. Separators are ignored.
    fn activate(&mut self, menu: MenuId, idx: usize, warp: bool, action: &mut Action) -> Result<(), SurfaceError> {
        match nav::activate(self.tree.menu(menu), idx) {
            nav::Activation::Ignored => {}
            nav::Activation::Descend(sub) => {
                self.active = sub;
                self.show(sub, Some(menu))?;
                self.tree.menu_mut(sub).selected = Some(0);
                *action = Action::CLEAR | Action::MAP | Action::DRAW;
                if warp {
                    *action |= Action::WARP;
                }
            }
            nav::Activation::Finish(output) => {
                self.outcome = Some(Outcome::Selected(output));
            }
        }
        Ok(())
    }

    fn key(
        &mut self,
        keysym: Keysym,
        utf8: Option<String>,
        shift: bool,
        action: &mut Action,
    ) -> Result<(), SurfaceError> {
        let active = self.active;

        match keysym {
            Keysym::Home => {
                let sel = nav::cycle(self.tree.menu(active), CycleDir::First);
                self.tree.menu_mut(active).selected = sel;
                *action = Action::CLEAR | Action::DRAW;
            }
            Keysym::End => {
                let sel = nav::cycle(self.tree.menu(active), CycleDir::Last);
                self.tree.menu_mut(active).selected = sel;
                *action = Action::CLEAR | Action::DRAW;
            }
            Keysym::Tab | Keysym::ISO_Left_Tab => {
                let backwards = shift || keysym == Keysym::ISO_Left_Tab;
                if self.typeahead.is_empty() {
                    let dir = if backwards { CycleDir::Prev } else { CycleDir::Next };
                    let sel = nav::cycle(self.tree.menu(active), dir);
                    self.tree.menu_mut(active).selected = sel;
                    *action = Action::CLEAR | Action::DRAW;
                } else {
                    let dir = if backwards { -1 } else { 1 };
                    let sel = nav::match_item(self.tree.menu(active), &self.typeahead, dir);
                    self.tree.menu_mut(active).selected = sel;
                    *action = Action::DRAW;
                }
            }
            Keysym::Up => {
                let sel = nav::cycle(self.tree.menu(active), CycleDir::Prev);
                self.tree.menu_mut(active).selected = sel;
                *action = Action::CLEAR | Action::DRAW;
            }
            Keysym::Down => {
                let sel = nav::cycle(self.tree.menu(active), CycleDir::Next);
                self.tree.menu_mut(active).selected = sel;
                *action = Action::CLEAR | Action::DRAW;
            }
            Keysym::Return | Keysym::KP_Enter | Keysym::Right => {
                if let Some(idx) = self.tree.menu(active).selected {
                    self.activate(active, idx, false, action)?;
                }
            }
            Keysym::Escape | Keysym::Left => match nav::fallback(self.tree.menu(active)) {
                nav::Fallback::Caller(caller) => {
                    self.active = caller;
                    *action = Action::CLEAR | Action::MAP | Action::DRAW;
                }
                // Left on the root is inert; Escape dismisses
                nav::Fallback::Dismiss if keysym == Keysym::Escape => {
                    self.outcome = Some(Outcome::Cancelled);
                }
                nav::Fallback::Dismiss => {}
            },
            Keysym::BackSpace | Keysym::Delete => {
                *action = Action::CLEAR | Action::DRAW;
            }
            _ => self.typed(active, utf8, action),
        }
        Ok(())
    }

    /// Digit shortcuts and incremental type-ahead.
    fn typed(&mut self, active: MenuId, utf8: Option<String>, action: &mut Action) {
        let Some(chr) = utf8.as_deref().and_then(|s| s.chars().next()) else {
            return;
        };

        if let Some(digit) = chr.to_digit(10).filter(|&d| d >= 1) {
            // digit d lands on the d-th selectable item
            let sel = {
                let menu = self.tree.menu(active);
                nav::cycle(menu, CycleDir::First).map(|mut i| {
                    for _ in 1..digit {
                        if let Some(next) = (i + 1..menu.items.len())
                            .find(|&j| !menu.items[j].is_separator())
                        {
                            i = next;
                        }
                    }
                    i
                })
            };
            self.tree.menu_mut(active).selected = sel;
            *action = Action::CLEAR | Action::DRAW;
            return;
        }

        if chr.is_control() {
            return;
        }

        // a failed match retries once with only the new character
        for _ in 0..2 {
            self.typeahead.push(chr);
            match nav::match_item(self.tree.menu(active), &self.typeahead, 0) {
                Some(idx) => {
                    self.tree.menu_mut(active).selected = Some(idx);
                    break;
                }
                None => {
                    self.tree.menu_mut(active).selected = None;
                    self.typeahead.clear();
                }
            }
        }
        *action = Action::DRAW;
    }

    fn apply(&mut self, action: Action) -> Result<(), SurfaceError> {
        if action.contains(Action::CLEAR) {
            self.typeahead.clear();
        }
        if action.contains(Action::MAP) {
            let caller = self.tree.menu(self.active).caller;
            self.show(self.active, caller)?;
        }
        if action.contains(Action::DRAW) {
            self.redraw(self.active);
        }
        if action.contains(Action::WARP) {
            // core wayland has no client-initiated pointer warp; the focus
            // point is reported and nothing else moves, so genuine motion
            // events keep flowing untouched
            let point = nav::selection_point(self.tree.menu(self.active), self.config.border_size);
            if let Some((x, y)) = point {
                debug!(x, y, "selection focus point");
            }
        }
        Ok(())
    }

    // === Dismiss timer ===

    fn arm_dismiss(&mut self) {
        self.cancel_dismiss();
        let timer = Timer::from_duration(DISMISS_DELAY);
        match self
            .loop_handle
            .insert_source(timer, |_, _, session: &mut Session<T>| {
                session.queue.push(Event::DismissExpired);
                TimeoutAction::Drop
            }) {
            Ok(token) => self.dismiss = Some(token),
            Err(err) => warn!(%err, "failed to arm dismiss timer"),
        }
    }

    fn cancel_dismiss(&mut self) {
        if let Some(token) = self.dismiss.take() {
            self.loop_handle.remove(token);
        }
    }
}

// === Wayland plumbing: every handler only enqueues ===

impl<T: Clone + 'static> Dispatch<ZwlrLayerShellV1, ()> for Session<T> {
    fn event(
        _: &mut Self,
        _: &ZwlrLayerShellV1,
        _: <ZwlrLayerShellV1 as Proxy>::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl<T: Clone + 'static> Dispatch<ZwlrLayerSurfaceV1, MenuId> for Session<T> {
    fn event(
        state: &mut Self,
        layer: &ZwlrLayerSurfaceV1,
        event: <ZwlrLayerSurfaceV1 as Proxy>::Event,
        &menu: &MenuId,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_layer_surface_v1::Event::Configure { serial, .. } => {
                // ack must precede the first attach; the attach itself is
                // driven by the queued event
                layer.ack_configure(serial);
                state.queue.push(Event::Configured { menu });
            }
            zwlr_layer_surface_v1::Event::Closed => {
                state.queue.push(Event::Closed { menu });
            }
            _ => {}
        }
    }
}

impl<T: Clone + 'static> Dispatch<wl_shm_pool::WlShmPool, ()> for Session<T> {
    fn event(
        _: &mut Self,
        _: &wl_shm_pool::WlShmPool,
        _: wl_shm_pool::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl<T: Clone + 'static> Dispatch<wl_buffer::WlBuffer, MenuId> for Session<T> {
    fn event(
        state: &mut Self,
        _: &wl_buffer::WlBuffer,
        event: wl_buffer::Event,
        &menu: &MenuId,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_buffer::Event::Release = event {
            state.queue.push(Event::BufferReleased { menu });
        }
    }
}

impl<T: Clone + 'static> CompositorHandler for Session<T> {
    fn scale_factor_changed(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_surface::WlSurface,
        _: i32,
    ) {
    }

    fn transform_changed(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_surface::WlSurface,
        _: wl_output::Transform,
    ) {
    }

    fn frame(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: u32) {}

    fn surface_enter(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_surface::WlSurface,
        _: &wl_output::WlOutput,
    ) {
    }

    fn surface_leave(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_surface::WlSurface,
        _: &wl_output::WlOutput,
    ) {
    }
}

impl<T: Clone + 'static> OutputHandler for Session<T> {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {
        self.refresh_monitor();
    }

    fn update_output(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {
        self.refresh_monitor();
    }

    fn output_destroyed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {}
}

impl<T: Clone + 'static> SeatHandler for Session<T> {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}

    fn new_capability(
        &mut self,
        _: &Connection,
        qh: &QueueHandle<Self>,
        seat: wl_seat::WlSeat,
        capability: Capability,
    ) {
        match capability {
            Capability::Keyboard if self.keyboard.is_none() => {
                match self.seat_state.get_keyboard(qh, &seat, None) {
                    Ok(keyboard) => self.keyboard = Some(keyboard),
                    Err(err) => warn!(%err, "failed to bind keyboard"),
                }
            }
            Capability::Pointer if self.pointer.is_none() => {
                match self.seat_state.get_pointer(qh, &seat) {
                    Ok(pointer) => self.pointer = Some(pointer),
                    Err(err) => warn!(%err, "failed to bind pointer"),
                }
            }
            _ => {}
        }
    }

    fn remove_capability(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: wl_seat::WlSeat,
        capability: Capability,
    ) {
        // each device is released through its own handle
        match capability {
            Capability::Keyboard => {
                if let Some(keyboard) = self.keyboard.take() {
                    keyboard.release();
                }
            }
            Capability::Pointer => {
                if let Some(pointer) = self.pointer.take() {
                    pointer.release();
                }
            }
            _ => {}
        }
    }

    fn remove_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}
}

impl<T: Clone + 'static> KeyboardHandler for Session<T> {
    fn enter(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: &wl_surface::WlSurface,
        _: u32,
        _: &[u32],
        _: &[Keysym],
    ) {
    }

    fn leave(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: &wl_surface::WlSurface,
        _: u32,
    ) {
    }

    fn press_key(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: u32,
        event: KeyEvent,
    ) {
        self.queue.push(Event::Key {
            keysym: event.keysym,
            utf8: event.utf8,
            shift: self.modifiers.shift,
        });
    }

    fn release_key(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: u32,
        _: KeyEvent,
    ) {
    }

    fn update_modifiers(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: u32,
        modifiers: Modifiers,
        _: u32,
    ) {
        self.modifiers = modifiers;
    }
}

impl<T: Clone + 'static> PointerHandler for Session<T> {
    fn pointer_frame(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_pointer::WlPointer,
        events: &[PointerEvent],
    ) {
        for event in events {
            let Some(menu) = self.menu_for_surface(&event.surface) else {
                continue;
            };
            let y = event.position.1;
            match event.kind {
                PointerEventKind::Enter { .. } => {
                    self.queue.push(Event::PointerEnter { menu, y });
                }
                PointerEventKind::Leave { .. } => {
                    self.queue.push(Event::PointerLeave { menu });
                }
                PointerEventKind::Motion { .. } => {
                    self.queue.push(Event::PointerMotion { menu, y });
                }
                PointerEventKind::Press { button, .. } => {
                    self.queue.push(Event::Button { menu, button, y });
                }
                PointerEventKind::Release { .. } => {}
                PointerEventKind::Axis { vertical, .. } => {
                    let delta = if vertical.discrete != 0 {
                        vertical.discrete as f64
                    } else {
                        vertical.absolute
                    };
                    if delta != 0.0 {
                        self.queue.push(Event::Axis { menu, delta });
                    }
                }
            }
        }
    }
}

impl<T: Clone + 'static> ShmHandler for Session<T> {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm
    }
}

impl<T: Clone + 'static> ProvidesRegistryState for Session<T> {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState, SeatState];
}

delegate_compositor!(@<T: Clone + 'static> Session<T>);
delegate_output!(@<T: Clone + 'static> Session<T>);
delegate_shm!(@<T: Clone + 'static> Session<T>);
delegate_seat!(@<T: Clone + 'static> Session<T>);
delegate_keyboard!(@<T: Clone + 'static> Session<T>);
delegate_pointer!(@<T: Clone + 'static> Session<T>);
delegate_registry!(@<T: Clone + 'static> Session<T>);
