//! Segment records owned by the track scroller.

use lane_runner_core::{Category, ContentKey, InstanceHandle, SegmentId, SlotCoord, WorldPosition};

/// One content instance placed into a segment at generation time.
#[derive(Clone, Debug)]
pub struct PlacedContent {
    pub(crate) cell: SlotCoord,
    pub(crate) key: ContentKey,
    pub(crate) category: Category,
    pub(crate) position: WorldPosition,
    pub(crate) handle: Option<InstanceHandle>,
}

impl PlacedContent {
    /// Cell the content occupies within its segment.
    #[must_use]
    pub const fn cell(&self) -> SlotCoord {
        self.cell
    }

    /// Pool key of the placed content.
    #[must_use]
    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    /// Category recorded for the placement.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// World-space position handed to the spawn port.
    #[must_use]
    pub const fn position(&self) -> WorldPosition {
        self.position
    }

    /// Handle of the acquired instance; absent when the acquire failed.
    #[must_use]
    pub const fn handle(&self) -> Option<InstanceHandle> {
        self.handle
    }
}

/// One generated stretch of track.
///
/// Segments are never mutated after creation; the scroller is the sole
/// authority over their creation and strictly-FIFO retirement.
#[derive(Clone, Debug)]
pub struct Segment {
    pub(crate) id: SegmentId,
    pub(crate) origin_z: f32,
    pub(crate) length: f32,
    pub(crate) slot_count: u32,
    pub(crate) bonus: bool,
    pub(crate) placements: Vec<PlacedContent>,
}

impl Segment {
    /// Identifier allocated by the scroller.
    #[must_use]
    pub const fn id(&self) -> SegmentId {
        self.id
    }

    /// World-space origin of the segment along the travel axis.
    #[must_use]
    pub const fn origin_z(&self) -> f32 {
        self.origin_z
    }

    /// Length of the segment in world units.
    #[must_use]
    pub const fn length(&self) -> f32 {
        self.length
    }

    /// World-space coordinate of the segment's far edge.
    #[must_use]
    pub fn end_z(&self) -> f32 {
        self.origin_z + self.length
    }

    /// Number of slots the segment was partitioned into.
    #[must_use]
    pub const fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Whether the segment belongs to a bonus corridor.
    #[must_use]
    pub const fn bonus(&self) -> bool {
        self.bonus
    }

    /// Content placed into the segment at generation time.
    #[must_use]
    pub fn placements(&self) -> &[PlacedContent] {
        &self.placements
    }
}
