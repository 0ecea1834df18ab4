// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A stack of features sharing one path.

use std::any::Any;
use std::fmt;

use peniko::kurbo::BezPath;

use crate::feature::{Feature, FeatureKind};
use crate::surface::Surface;
use crate::Result;

/// The object-safe face of a [`Feature`], used to store features of mixed kinds.
pub trait GaugeFeature {
    /// The feature's tag, if any.
    fn tag(&self) -> Option<&str>;

    /// Replace the path.
    fn set_path(&mut self, path: Option<BezPath>);

    /// Force the next draw to render again.
    fn refresh(&mut self);

    /// Draw onto `surface`.
    fn draw(&mut self, surface: &mut dyn Surface) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<K: FeatureKind + 'static> GaugeFeature for Feature<K> {
    fn tag(&self) -> Option<&str> {
        self.config().tag.as_deref()
    }

    fn set_path(&mut self, path: Option<BezPath>) {
        Self::set_path(self, path);
    }

    fn refresh(&mut self) {
        Self::refresh(self);
    }

    fn draw(&mut self, surface: &mut dyn Surface) -> Result<()> {
        Self::draw(self, surface)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Features drawn over a shared path, in the order they were added.
#[derive(Default)]
pub struct Gauge {
    path: Option<BezPath>,
    features: Vec<Box<dyn GaugeFeature>>,
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gauge")
            .field("path", &self.path)
            .field("features", &self.features.len())
            .finish()
    }
}

impl Gauge {
    pub fn new(path: Option<BezPath>) -> Self {
        Self {
            path,
            features: vec![],
        }
    }

    pub fn path(&self) -> Option<&BezPath> {
        self.path.as_ref()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Add a feature on top of the others. It takes over the gauge path.
    ///
    /// Returns the feature's index.
    pub fn push<K: FeatureKind + 'static>(&mut self, mut feature: Feature<K>) -> usize {
        feature.set_path(self.path.clone());
        self.features.push(Box::new(feature));
        self.features.len() - 1
    }

    /// Replace the path of the gauge and of every feature.
    pub fn set_path(&mut self, path: Option<BezPath>) {
        for feature in &mut self.features {
            feature.set_path(path.clone());
        }
        self.path = path;
    }

    /// Refresh every feature.
    pub fn refresh(&mut self) {
        for feature in &mut self.features {
            feature.refresh();
        }
    }

    /// Draw every feature, bottom first. Stops at the first error.
    pub fn draw(&mut self, surface: &mut dyn Surface) -> Result<()> {
        for feature in &mut self.features {
            feature.draw(surface)?;
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&(dyn GaugeFeature + 'static)> {
        self.features.get(index).map(|feature| &**feature)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn GaugeFeature + 'static)> {
        self.features.get_mut(index).map(|feature| &mut **feature)
    }

    /// The first feature carrying `tag`.
    pub fn find(&mut self, tag: &str) -> Option<&mut (dyn GaugeFeature + 'static)> {
        self.features
            .iter_mut()
            .find(|feature| feature.tag() == Some(tag))
            .map(|feature| &mut **feature)
    }

    /// The first feature carrying `tag`, if it is of kind `K`.
    pub fn find_as<K: FeatureKind + 'static>(&mut self, tag: &str) -> Option<&mut Feature<K>> {
        self.find(tag)?.as_any_mut().downcast_mut()
    }
}
