pub(crate) mod fs;
pub(crate) mod probe;
pub(crate) mod source;
