//! GPU uniform layouts shared by the OpenReality rendering backends.

pub mod uniforms;
