//! Presentation of one menu as a wlr-layer-shell surface.
//!
//! Each menu owns a [`MenuSurface`]: a wl_surface with an overlay layer
//! role, a shared-memory pool over an anonymous memfd, and a
//! [`FrameSlot`] enforcing the one-buffer-in-flight rule. The compositor
//! acknowledges geometry through the configure/ack handshake before the
//! first attach; the dispatcher publishes frames only after that.
//!
//! Buffer discipline: frames are rendered into a client-side staging
//! buffer and copied into the pool only at publish time, when no buffer
//! is in flight. A publish then creates a wl_buffer over the pool,
//! attaches and commits it. The buffer stays in flight until the
//! compositor releases it; a publish requested meanwhile is deferred
//! and replayed exactly once after the release, so the compositor never
//! observes a frame mutating under it.

use std::os::fd::AsFd;

use memfd::{Memfd, MemfdOptions};
use memmap2::MmapMut;
use smithay_client_toolkit::compositor::{CompositorState, SurfaceData};
use smithay_client_toolkit::shm::Shm;
use thiserror::Error;
use wayland_client::protocol::wl_buffer::WlBuffer;
use wayland_client::protocol::wl_shm;
use wayland_client::protocol::wl_shm_pool::WlShmPool;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Dispatch, QueueHandle};
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1::{
    Layer, ZwlrLayerShellV1,
};
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_surface_v1::{
    Anchor, KeyboardInteractivity, ZwlrLayerSurfaceV1,
};

use crate::draw::Canvas;
use crate::tree::MenuId;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("shared memory allocation failed: {0}")]
    Memfd(#[from] memfd::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("required compositor global missing: {0}")]
    MissingGlobal(&'static str),
}

/// Per-surface buffer state. At most one wl_buffer exists per surface;
/// the type makes a second attach while one is in flight unrepresentable.
#[derive(Debug, Default)]
pub enum FrameSlot<B> {
    /// No buffer in flight; the next publish may attach.
    #[default]
    Empty,
    /// One buffer attached and not yet released.
    Attached(B),
    /// One buffer in flight and a newer frame waiting for its release.
    PendingRelease(B),
}

impl<B> FrameSlot<B> {
    /// Try to publish a frame. Runs `attach` and returns `true` when the
    /// slot is free; otherwise records the request for replay on release.
    pub fn publish(&mut self, attach: impl FnOnce() -> B) -> bool {
        match std::mem::replace(self, FrameSlot::Empty) {
            FrameSlot::Empty => {
                *self = FrameSlot::Attached(attach());
                true
            }
            FrameSlot::Attached(buf) | FrameSlot::PendingRelease(buf) => {
                *self = FrameSlot::PendingRelease(buf);
                false
            }
        }
    }

    /// The compositor released the in-flight buffer. Returns the buffer
    /// to destroy and whether a deferred publish must be replayed.
    pub fn release(&mut self) -> (Option<B>, bool) {
        match std::mem::replace(self, FrameSlot::Empty) {
            FrameSlot::Empty => (None, false),
            FrameSlot::Attached(buf) => (Some(buf), false),
            FrameSlot::PendingRelease(buf) => (Some(buf), true),
        }
    }

    /// Abandon the slot, surrendering any in-flight buffer.
    pub fn take(&mut self) -> Option<B> {
        match std::mem::replace(self, FrameSlot::Empty) {
            FrameSlot::Empty => None,
            FrameSlot::Attached(buf) | FrameSlot::PendingRelease(buf) => Some(buf),
        }
    }

    pub fn in_flight(&self) -> bool {
        !matches!(self, FrameSlot::Empty)
    }
}

/// Anonymous shared-memory backing for one surface: a sealed memfd, a
/// writable mapping over it, and the wl_shm pool handed to the
/// compositor.
struct ShmBacking {
    map: MmapMut,
    pool: WlShmPool,
    // keeps the fd alive for the lifetime of the pool
    _memfd: Memfd,
}

impl ShmBacking {
    fn new<D>(shm: &Shm, size: usize, qh: &QueueHandle<D>) -> Result<Self, SurfaceError>
    where
        D: Dispatch<WlShmPool, ()> + 'static,
    {
        let memfd = MemfdOptions::default()
            .close_on_exec(true)
            .create("layermenu-frame")?;
        memfd.as_file().set_len(size as u64)?;
        let map = unsafe { MmapMut::map_mut(memfd.as_file()) }?;
        let pool = shm
            .wl_shm()
            .create_pool(memfd.as_file().as_fd(), size as i32, qh, ());
        Ok(Self {
            map,
            pool,
            _memfd: memfd,
        })
    }
}

/// Wayland-side state of one menu.
pub struct MenuSurface {
    wl_surface: Option<WlSurface>,
    layer: Option<ZwlrLayerSurfaceV1>,
    shm: Option<ShmBacking>,
    /// Frame under construction; copied into the pool at publish time.
    staging: Vec<u8>,
    pub slot: FrameSlot<WlBuffer>,
    /// Set once the first configure was acknowledged; frames may only be
    /// attached after that.
    pub configured: bool,
    size: (i32, i32),
}

impl MenuSurface {
    pub fn new() -> Self {
        Self {
            wl_surface: None,
            layer: None,
            shm: None,
            staging: Vec::new(),
            slot: FrameSlot::Empty,
            configured: false,
            size: (0, 0),
        }
    }

    pub fn is_created(&self) -> bool {
        self.wl_surface.is_some()
    }

    /// The backing wl_surface, used to route pointer focus back to a menu.
    pub fn wl_surface(&self) -> Option<&WlSurface> {
        self.wl_surface.as_ref()
    }

    /// Materialize or reposition the surface. On first use this allocates
    /// the shm backing and requests the overlay layer role anchored
    /// top-left with the menu position as margin; afterwards only the
    /// margin changes, the surface identity is stable.
    #[allow(clippy::too_many_arguments)]
    pub fn update<D>(
        &mut self,
        compositor: &CompositorState,
        layer_shell: &ZwlrLayerShellV1,
        shm: &Shm,
        qh: &QueueHandle<D>,
        id: MenuId,
        width: i32,
        height: i32,
        position: (i32, i32),
    ) -> Result<(), SurfaceError>
    where
        D: Dispatch<WlSurface, SurfaceData>
            + Dispatch<ZwlrLayerSurfaceV1, MenuId>
            + Dispatch<WlShmPool, ()>
            + 'static,
    {
        let (x, y) = position;
        if let (Some(surface), Some(layer)) = (&self.wl_surface, &self.layer) {
            layer.set_margin(y, 0, 0, x);
            surface.commit();
            return Ok(());
        }

        let stride = width * 4;
        self.shm = Some(ShmBacking::new(shm, (stride * height) as usize, qh)?);
        self.staging = vec![0; (stride * height) as usize];
        self.size = (width, height);

        let surface = compositor.create_surface(qh);
        let layer = layer_shell.get_layer_surface(
            &surface,
            None,
            Layer::Overlay,
            "menu".to_string(),
            qh,
            id,
        );
        layer.set_keyboard_interactivity(KeyboardInteractivity::OnDemand);
        layer.set_anchor(Anchor::Top | Anchor::Left);
        layer.set_margin(y, 0, 0, x);
        layer.set_size(width as u32, height as u32);
        layer.set_exclusive_zone(0);
        surface.commit();

        self.wl_surface = Some(surface);
        self.layer = Some(layer);
        Ok(())
    }

    /// Writable pixel view over the staging frame. The pool itself is
    /// only written at publish time, while no buffer is in flight.
    pub fn canvas(&mut self) -> Option<Canvas<'_>> {
        if self.staging.is_empty() {
            return None;
        }
        let (width, height) = self.size;
        Some(Canvas::new(&mut self.staging, width, height, width * 4))
    }

    /// Publish the staging frame. Returns `true` when it was copied into
    /// the pool and a buffer attached; `false` when unconfigured or
    /// deferred behind an in-flight buffer.
    pub fn publish<D>(&mut self, qh: &QueueHandle<D>, id: MenuId) -> bool
    where
        D: Dispatch<WlBuffer, MenuId> + 'static,
    {
        if !self.configured {
            return false;
        }
        let (Some(surface), Some(shm)) = (&self.wl_surface, &mut self.shm) else {
            return false;
        };
        let (width, height) = self.size;
        let staging = &self.staging;
        let published = self.slot.publish(|| {
            // the slot is free, so the compositor holds no view of the pool
            shm.map[..].copy_from_slice(staging);
            surface.damage(0, 0, width, height);
            let buffer =
                shm.pool
                    .create_buffer(0, width, height, width * 4, wl_shm::Format::Abgr8888, qh, id);
            surface.attach(Some(&buffer), 0, 0);
            buffer
        });
        if published {
            surface.commit();
        }
        published
    }

    /// Handle the compositor's release of the in-flight buffer. Returns
    /// `true` when a deferred publish must be replayed.
    pub fn on_release(&mut self) -> bool {
        let (buffer, republish) = self.slot.release();
        if let Some(buffer) = buffer {
            buffer.destroy();
        }
        republish
    }

    /// Tear the surface down. Any in-flight buffer is abandoned; the
    /// compositor forgets it together with the surface.
    pub fn hide(&mut self) {
        if let Some(buffer) = self.slot.take() {
            buffer.destroy();
        }
        if let Some(layer) = self.layer.take() {
            layer.destroy();
        }
        if let Some(surface) = self.wl_surface.take() {
            surface.destroy();
        }
        if let Some(shm) = self.shm.take() {
            shm.pool.destroy();
        }
        self.staging = Vec::new();
        self.size = (0, 0);
        self.configured = false;
    }
}

impl Default for MenuSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_attaches_when_empty() {
        let mut slot: FrameSlot<u32> = FrameSlot::Empty;
        assert!(slot.publish(|| 1));
        assert!(slot.in_flight());
    }

    #[test]
    fn test_slot_defers_while_in_flight() {
        let mut slot: FrameSlot<u32> = FrameSlot::Empty;
        assert!(slot.publish(|| 1));
        // second and third publish both defer; the attach closure must
        // not run
        assert!(!slot.publish(|| panic!("attached over an in-flight buffer")));
        assert!(!slot.publish(|| panic!("attached over an in-flight buffer")));

        let (buf, republish) = slot.release();
        assert_eq!(buf, Some(1));
        assert!(republish, "deferred publish replays once");

        // the replay itself
        assert!(slot.publish(|| 2));
        let (buf, republish) = slot.release();
        assert_eq!(buf, Some(2));
        assert!(!republish);
    }

    #[test]
    fn test_slot_release_without_attach_is_spurious() {
        let mut slot: FrameSlot<u32> = FrameSlot::Empty;
        let (buf, republish) = slot.release();
        assert_eq!(buf, None);
        assert!(!republish);
    }

    #[test]
    fn test_pool_copy_waits_for_release() {
        // the pool copy lives inside the attach closure, so bytes the
        // compositor may still be reading are never overwritten
        let mut pool = [0u8; 4];
        let mut slot: FrameSlot<u32> = FrameSlot::Empty;

        let first = [7u8; 4];
        assert!(slot.publish(|| {
            pool.copy_from_slice(&first);
            1
        }));
        assert_eq!(pool, first);

        let newer = [9u8; 4];
        assert!(!slot.publish(|| {
            pool.copy_from_slice(&newer);
            2
        }));
        assert_eq!(pool, first, "in-flight frame bytes stay intact");

        let (_, republish) = slot.release();
        assert!(republish);
        assert!(slot.publish(|| {
            pool.copy_from_slice(&newer);
            2
        }));
        assert_eq!(pool, newer);
    }

    #[test]
    fn test_slot_take_abandons_buffer() {
        let mut slot: FrameSlot<u32> = FrameSlot::Empty;
        slot.publish(|| 7);
        assert_eq!(slot.take(), Some(7));
        assert!(!slot.in_flight());
    }
}
