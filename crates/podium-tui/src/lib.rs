// Library root: the terminal host, exposed so its tests and the binary share
// one module tree.

pub mod slots;
pub mod tui;
