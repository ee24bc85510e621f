pub mod block_entity;
pub mod world;
