use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Unique identifier for a top-level node in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Pose class reported by the classifier.
/// The numeric value is the classifier's output index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseLabel {
    ChargedSphere,
    Walk,
    Upright,
    SpiritBomb,
    ArmsSpread,
    DiscRight,
    DiscLeft,
    ChargedSphereLeft,
    BeamPose,
    BeamRelease,
    Teleport,
    PowerUp,
    HandsToEars,
    ComedyPose,
    ComedyFinish,
}

impl PoseLabel {
    pub const ALL: [PoseLabel; 15] = [
        PoseLabel::ChargedSphere,
        PoseLabel::Walk,
        PoseLabel::Upright,
        PoseLabel::SpiritBomb,
        PoseLabel::ArmsSpread,
        PoseLabel::DiscRight,
        PoseLabel::DiscLeft,
        PoseLabel::ChargedSphereLeft,
        PoseLabel::BeamPose,
        PoseLabel::BeamRelease,
        PoseLabel::Teleport,
        PoseLabel::PowerUp,
        PoseLabel::HandsToEars,
        PoseLabel::ComedyPose,
        PoseLabel::ComedyFinish,
    ];

    /// Map a classifier index to a label. Negative or unknown indices yield `None`.
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Every effect the engine knows, in registration (animation) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    HairAura,
    EnergySphere,
    DescendingFigure,
    BodyAura,
    Beam,
    RingOverlay,
    Teleport,
    NarrativeBlackout,
    IntroNarration,
}

impl EffectKind {
    pub const ALL: [EffectKind; 9] = [
        EffectKind::HairAura,
        EffectKind::EnergySphere,
        EffectKind::DescendingFigure,
        EffectKind::BodyAura,
        EffectKind::Beam,
        EffectKind::RingOverlay,
        EffectKind::Teleport,
        EffectKind::NarrativeBlackout,
        EffectKind::IntroNarration,
    ];

    /// Blocking effects are mutually exclusive: at most one runs at a time.
    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            EffectKind::EnergySphere
                | EffectKind::Beam
                | EffectKind::Teleport
                | EffectKind::IntroNarration
                | EffectKind::NarrativeBlackout
        )
    }

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::HairAura => "hair-aura",
            EffectKind::EnergySphere => "energy-sphere",
            EffectKind::DescendingFigure => "descending-figure",
            EffectKind::BodyAura => "body-aura",
            EffectKind::Beam => "beam",
            EffectKind::RingOverlay => "ring-overlay",
            EffectKind::Teleport => "teleport",
            EffectKind::NarrativeBlackout => "narrative-blackout",
            EffectKind::IntroNarration => "intro-narration",
        }
    }
}

/// Signals raised by effects during `animate`, consumed by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectEvent {
    /// The effect reached its terminal stage and released its nodes.
    Completed(EffectKind),
    /// The narrative blackout went dark.
    DarkWindow,
    /// The narrative blackout lifted.
    LightRestored,
}

impl EffectEvent {
    pub const KIND_COMPLETED: f32 = 1.0;
    pub const KIND_DARK_WINDOW: f32 = 2.0;
    pub const KIND_LIGHT_RESTORED: f32 = 3.0;

    pub fn to_wire(self) -> WireEvent {
        match self {
            EffectEvent::Completed(kind) => WireEvent {
                kind: Self::KIND_COMPLETED,
                a: kind.index() as f32,
                ..Default::default()
            },
            EffectEvent::DarkWindow => WireEvent {
                kind: Self::KIND_DARK_WINDOW,
                ..Default::default()
            },
            EffectEvent::LightRestored => WireEvent {
                kind: Self::KIND_LIGHT_RESTORED,
                ..Default::default()
            },
        }
    }
}

/// An effect event as it crosses into the host's shared buffer.
/// Generic container: `kind` identifies the event, `a/b/c` carry payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct WireEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl WireEvent {
    pub const FLOATS: usize = 4;
}
