//! Materials: a program plus the uniform and texture values it is drawn with.
//!
//! A [`Material`] borrows its [`Program`]; the borrow checker keeps the
//! program alive for as long as any material refers to it.

use std::collections::BTreeMap;

use crate::device::{RawId, TextureTarget, UniformLocation};
use crate::shader::Program;
use crate::uniform::UniformValue;

/// Cached outcome of looking a uniform name up in the program.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Resolution {
    /// Not looked up yet.
    Pending,
    Found(UniformLocation),
    /// The program does not expose the name. Binding skips it.
    Missing,
}

#[derive(Debug, Clone)]
struct MaterialUniform {
    value: UniformValue,
    resolution: Resolution,
}

/// A texture attached to a texture unit when the material binds.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureBinding {
    pub texture: RawId,
    pub target: TextureTarget,
    pub unit: u32,
}

#[derive(Debug, Clone)]
pub struct Material<'p> {
    program: &'p Program,
    uniforms: BTreeMap<String, MaterialUniform>,
    textures: Vec<TextureBinding>,
}

impl<'p> Material<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            uniforms: BTreeMap::new(),
            textures: Vec::new(),
        }
    }

    #[inline]
    pub fn program(&self) -> &'p Program {
        self.program
    }

    /// Inserts or overwrites the value for `name`.
    ///
    /// Overwriting keeps an already resolved location. New names stay
    /// pending until the next [`resolve_uniforms`](Self::resolve_uniforms).
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        let value = value.into();
        self.uniforms
            .entry(name.into())
            .and_modify(|u| u.value = value)
            .or_insert(MaterialUniform {
                value,
                resolution: Resolution::Pending,
            });
    }

    pub fn value(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).map(|u| u.value)
    }

    /// Declares a texture to bind on `unit`. Later bindings on the same unit
    /// replace earlier ones.
    pub fn add_texture(&mut self, texture: RawId, target: TextureTarget, unit: u32) {
        self.textures.retain(|t| t.unit != unit);
        self.textures.push(TextureBinding {
            texture,
            target,
            unit,
        });
    }

    pub fn textures(&self) -> &[TextureBinding] {
        &self.textures
    }

    /// Looks up every pending name once and caches the result.
    ///
    /// Names already resolved are left alone, so running it again yields the
    /// same locations.
    pub fn resolve_uniforms(&mut self) {
        let program = self.program;
        for (name, uniform) in &mut self.uniforms {
            if uniform.resolution != Resolution::Pending {
                continue;
            }
            uniform.resolution = match program.uniform_location(name) {
                Some(location) => Resolution::Found(location),
                None => {
                    log::debug!(
                        "{} value `{name}` stays unset for program {}",
                        uniform.value.glsl_type(),
                        program.id()
                    );
                    Resolution::Missing
                }
            };
        }
    }

    /// Resolution state of `name`, or `None` if it was never set.
    pub fn resolution(&self, name: &str) -> Option<Resolution> {
        self.uniforms.get(name).map(|u| u.resolution)
    }

    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        match self.resolution(name)? {
            Resolution::Found(location) => Some(location),
            _ => None,
        }
    }

    /// Names that would not be uploaded by [`bind`](Self::bind).
    pub fn unresolved(&self) -> impl Iterator<Item = &str> + '_ {
        self.uniforms
            .iter()
            .filter(|(_, u)| !matches!(u.resolution, Resolution::Found(_)))
            .map(|(name, _)| name.as_str())
    }

    /// Activates the program, uploads every resolved uniform and binds the
    /// declared textures. Never touches the resolution cache.
    pub fn bind(&self) {
        self.program.bind();
        let device = self.program.device();

        for (name, uniform) in &self.uniforms {
            match uniform.resolution {
                Resolution::Found(location) => device.set_uniform(location, &uniform.value),
                Resolution::Pending => {
                    log::trace!("uniform `{name}` bound before resolve_uniforms; skipped")
                }
                Resolution::Missing => {}
            }
        }

        for texture in &self.textures {
            device.bind_texture(texture.unit, texture.target, texture.texture);
        }
    }
}
