//! Job input resolution: speech, remote media, character art and post cards.

pub mod card;
pub mod media;
pub mod resolver;
pub mod text_raster;
