pub use crate::config::ColConfig;
pub use crate::consts::{ColFlag, ColVersion};
pub use crate::container::ColFile;
pub use crate::error::{ColError, Result};
pub use crate::model::ColModel;
pub use crate::reader::ColReader;
pub use crate::sections::{Bounds, ColBox, Face, FaceGroup, Sphere, Surface};
pub use crate::writer::write_model;
