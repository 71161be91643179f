pub mod align;
pub mod io;
pub mod phylo;
pub mod scoring;
pub mod similarity;
