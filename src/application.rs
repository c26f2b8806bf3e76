//! Application layer
//!
//! The load cycle: fetching, image validation, card building and the
//! state machine that owns the display container.

pub mod card_builder;
pub mod context;
pub mod display;
pub mod image_validator;
pub mod orchestrator;
pub mod state;

pub use card_builder::{CardBuilder, ProductCard};
pub use context::StorefrontContext;
pub use display::{DisplayContainer, LivePage, PageView};
pub use image_validator::{ImageValidator, ValidationOutcome, ValidationSummary};
pub use orchestrator::{EventResponse, ImageStrategy, Navigation, StorefrontOrchestrator, UiEvent};
pub use state::{LoadOutcome, LoadState};
