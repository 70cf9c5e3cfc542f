pub(crate) mod emit;
pub(crate) mod health;
pub(crate) mod ws;
