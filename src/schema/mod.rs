pub mod companion;
pub mod ending;
pub mod enemy;
pub mod player;
pub mod scene;
