// Ops modules — CPU implementations behind the ImageProcessor trait.

pub mod adjustments;
pub mod effects;
pub mod filters;
pub mod indexed;
pub mod transform;
