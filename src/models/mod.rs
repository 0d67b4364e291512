pub mod item;
pub mod plateau;
pub mod reservation;
