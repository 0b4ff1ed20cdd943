//! Radial distribution functions (RDFDAT).

/// One pair's g(r) curve.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RdfPair {
    pub species: (String, String),
    /// `(r, g(r))` samples in file order.
    pub samples: Vec<(f64, f64)>,
}

impl RdfPair {
    pub fn radii(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|(r, _)| *r)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|(_, g)| *g)
    }

    fn matches(&self, a: &str, b: &str) -> bool {
        let (x, y) = (&self.species.0, &self.species.1);
        (x == a && y == b) || (x == b && y == a)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rdf {
    pub title: String,
    pub points: usize,
    pub pairs: Vec<RdfPair>,
}

impl Rdf {
    #[inline]
    pub fn n_rdf(&self) -> usize {
        self.pairs.len()
    }

    /// Curve for a species pair in either order.
    pub fn pair(&self, a: &str, b: &str) -> Option<&RdfPair> {
        self.pairs.iter().find(|p| p.matches(a, b))
    }
}
