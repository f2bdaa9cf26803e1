#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    Fx,
    Fy,
    Fz,
    Mx,
    My,
    Mz,
}

impl Component {
    pub const ALL: [Component; 6] = [
        Component::Fx,
        Component::Fy,
        Component::Fz,
        Component::Mx,
        Component::My,
        Component::Mz,
    ];

    pub fn from_offset(offset: usize) -> Option<Self> {
        Self::ALL.get(offset).copied()
    }

    pub fn offset(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Component::Fx => "Fx",
            Component::Fy => "Fy",
            Component::Fz => "Fz",
            Component::Mx => "Mx",
            Component::My => "My",
            Component::Mz => "Mz",
        }
    }
}

/// body axis forces and moments
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Loads {
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
}

impl Loads {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Fx => self.fx,
            Component::Fy => self.fy,
            Component::Fz => self.fz,
            Component::Mx => self.mx,
            Component::My => self.my,
            Component::Mz => self.mz,
        }
    }

    pub fn to_array(&self) -> ndarray::Array1<f64> {
        ndarray::array![self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }
}

impl<S> From<&ndarray::ArrayBase<S, ndarray::Ix1>> for Loads
where
    S: ndarray::Data<Elem = f64>,
{
    fn from(v: &ndarray::ArrayBase<S, ndarray::Ix1>) -> Self {
        assert_eq!(v.len(), 6);

        Self {
            fx: v[0],
            fy: v[1],
            fz: v[2],
            mx: v[3],
            my: v[4],
            mz: v[5],
        }
    }
}

impl std::ops::Sub for Loads {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            fx: self.fx - rhs.fx,
            fy: self.fy - rhs.fy,
            fz: self.fz - rhs.fz,
            mx: self.mx - rhs.mx,
            my: self.my - rhs.my,
            mz: self.mz - rhs.mz,
        }
    }
}
