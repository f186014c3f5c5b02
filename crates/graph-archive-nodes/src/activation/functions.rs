use crate::activation::Activation;
use graph_archive::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use graph_archive::dtype::{DType, Element};
use graph_archive::graph::TypeName;
use std::marker::PhantomData;

macro_rules! parameterless_activation {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name<T: Element> {
            _phantom: PhantomData<T>,
        }

        impl<T: Element> $name<T> {
            pub fn new() -> Self {
                Self { _phantom: PhantomData }
            }
        }

        impl<T: Element> TypeName for $name<T> {
            fn type_name() -> String {
                format!("{}<{}>", stringify!($name), T::DTYPE.type_name())
            }
        }

        impl<T: Element> Archivable for $name<T> {
            fn type_tag(&self) -> String {
                Self::type_name()
            }

            fn archive(&self, _archiver: &mut Archiver) -> Result<(), ArchiveError> {
                Ok(())
            }

            fn unarchive(&mut self, _unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
                Ok(())
            }
        }

        impl<T: Element> Activation for $name<T> {
            fn dtype(&self) -> DType {
                T::DTYPE
            }
        }
    };
}

parameterless_activation!(ReLUActivation, "`max(x, 0)`");
parameterless_activation!(SigmoidActivation, "`1 / (1 + exp(-x))`");
parameterless_activation!(TanhActivation, "Hyperbolic tangent.");

/// `x` for positive inputs, `alpha * x` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct LeakyReLUActivation<T: Element> {
    alpha: T,
}

impl<T: Element> LeakyReLUActivation<T> {
    pub fn new(alpha: T) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> T {
        self.alpha
    }
}

impl<T: Element> Default for LeakyReLUActivation<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Element> TypeName for LeakyReLUActivation<T> {
    fn type_name() -> String {
        format!("LeakyReLUActivation<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for LeakyReLUActivation<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write("alpha", &self.alpha)
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        self.alpha = unarchiver.read("alpha")?;
        Ok(())
    }
}

impl<T: Element> Activation for LeakyReLUActivation<T> {
    fn dtype(&self) -> DType {
        T::DTYPE
    }
}

/// Piecewise linear approximation of the sigmoid, `clamp(alpha * x + beta, 0, 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HardSigmoidActivation<T: Element> {
    alpha: T,
    beta: T,
}

impl<T: Element> HardSigmoidActivation<T> {
    pub fn new(alpha: T, beta: T) -> Self {
        Self { alpha, beta }
    }

    pub fn alpha(&self) -> T {
        self.alpha
    }

    pub fn beta(&self) -> T {
        self.beta
    }
}

impl<T: Element> Default for HardSigmoidActivation<T> {
    fn default() -> Self {
        Self::new(T::default(), T::default())
    }
}

impl<T: Element> TypeName for HardSigmoidActivation<T> {
    fn type_name() -> String {
        format!("HardSigmoidActivation<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for HardSigmoidActivation<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write("alpha", &self.alpha)?;
        archiver.write("beta", &self.beta)
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        self.alpha = unarchiver.read("alpha")?;
        self.beta = unarchiver.read("beta")?;
        Ok(())
    }
}

impl<T: Element> Activation for HardSigmoidActivation<T> {
    fn dtype(&self) -> DType {
        T::DTYPE
    }
}

/// Leaky ReLU with one learned slope per element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParametricReLUActivation<T: Element> {
    alpha: Vec<T>,
}

impl<T: Element> ParametricReLUActivation<T> {
    pub fn new(alpha: Vec<T>) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> &[T] {
        &self.alpha
    }
}

impl<T: Element> TypeName for ParametricReLUActivation<T> {
    fn type_name() -> String {
        format!("ParametricReLUActivation<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for ParametricReLUActivation<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write("alpha", &self.alpha)
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        self.alpha = unarchiver.read("alpha")?;
        Ok(())
    }
}

impl<T: Element> Activation for ParametricReLUActivation<T> {
    fn dtype(&self) -> DType {
        T::DTYPE
    }

    fn expected_size(&self) -> Option<usize> {
        Some(self.alpha.len())
    }
}
