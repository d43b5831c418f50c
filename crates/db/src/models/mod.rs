//! Row structs (`FromRow`) and request DTOs, one module per table family.

pub mod audit;
pub mod batch;
pub mod facility;
pub mod harvest;
pub mod metrc_tag;
pub mod plant;
pub mod plant_event;
pub mod rack;
pub mod room;
pub mod strain;
pub mod tray;
