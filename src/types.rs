use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    A,
    C,
    D,
    E,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::A => "A",
            Component::C => "C",
            Component::D => "D",
            Component::E => "E",
        }
    }

    pub fn stem(&self) -> &'static str {
        match self {
            Component::A => "a",
            Component::C => "c",
            Component::D => "d",
            Component::E => "e",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Twin {
    One,
    Two,
}

impl Twin {
    pub const BOTH: [Twin; 2] = [Twin::One, Twin::Two];

    pub fn index(&self) -> usize {
        match self {
            Twin::One => 1,
            Twin::Two => 2,
        }
    }

    pub fn other(&self) -> Twin {
        match self {
            Twin::One => Twin::Two,
            Twin::Two => Twin::One,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn suffix(&self) -> &'static str {
        match self {
            Sex::Male => "m",
            Sex::Female => "f",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phenotypes {
    pub twin1: String,
    pub twin2: String,
}

impl Phenotypes {
    pub fn new(twin1: impl Into<String>, twin2: impl Into<String>) -> Self {
        Self {
            twin1: twin1.into(),
            twin2: twin2.into(),
        }
    }

    pub fn from_base(base: &str) -> Self {
        Self::new(format!("{base}1"), format!("{base}2"))
    }

    pub fn name(&self, twin: Twin) -> &str {
        match twin {
            Twin::One => &self.twin1,
            Twin::Two => &self.twin2,
        }
    }

    pub fn names(&self) -> Vec<String> {
        vec![self.twin1.clone(), self.twin2.clone()]
    }
}

impl Default for Phenotypes {
    fn default() -> Self {
        Self::from_base("P")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Var {
    Latent(Component, Twin),
    Phenotype(Twin),
}

impl Var {
    pub fn name(&self, phenotypes: &Phenotypes) -> String {
        match self {
            Var::Latent(component, twin) => format!("{component}{}", twin.index()),
            Var::Phenotype(twin) => phenotypes.name(*twin).to_string(),
        }
    }
}
