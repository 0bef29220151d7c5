pub mod bindings;
pub mod quad;
pub mod reference;
pub mod reflect;
pub mod shaders;
pub mod vertex;
