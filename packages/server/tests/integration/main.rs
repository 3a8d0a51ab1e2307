mod assets;
mod common;
