pub mod plan;
pub mod split;
pub mod toc;
