/// Resolution of arbitrary reference strings against the members of one extracted archive.
pub mod handles;
pub mod index;
pub mod resolver;
pub mod session;
