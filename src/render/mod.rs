pub(crate) mod backend;
pub(crate) mod filter_graph;
pub(crate) mod raster;
