//! Specimens — frozen annotations for post-hoc analysis

mod assemblage;
mod snapshot;
mod view;

pub use assemblage::{Assemblage, AssemblageError};
pub use snapshot::{Specimen, SpecimenError};
pub use view::StratigraphicView;
