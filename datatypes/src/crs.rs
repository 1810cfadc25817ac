use std::fmt;

/// An opaque handle identifying a coordinate reference system by
/// authority and code (e.g. `EPSG:4326`). Two `Crs` values compare
/// equal iff they name the same authority/code pair; no attempt is
/// made to recognize equivalent CRSs expressed differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Crs {
    authority: &'static str,
    code: u32,
}

impl Crs {
    pub const EPSG_4326: Crs = Crs {
        authority: "EPSG",
        code: 4326,
    };

    pub const EPSG_3857: Crs = Crs {
        authority: "EPSG",
        code: 3857,
    };

    pub const fn epsg(code: u32) -> Crs {
        Crs {
            authority: "EPSG",
            code,
        }
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn authority(&self) -> &str {
        self.authority
    }

    /// `true` for CRSs whose coordinates are in a linear unit (meters),
    /// as opposed to geographic (degrees). EPSG geographic CRSs live in
    /// the 4000-4999 range (4326 included); everything else under the
    /// EPSG authority is treated as projected. This is a heuristic, not
    /// an exhaustive classification, but it is the one the spec's
    /// scale-sensitive math (§4.1 step 1) actually needs.
    pub fn is_projected(&self) -> bool {
        !(self.authority == "EPSG" && (4000..5000).contains(&self.code))
    }

    /// The PROJ string this CRS resolves to, used to build transforms.
    pub fn proj_string(&self) -> String {
        format!("{}:{}", self.authority, self.code)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

impl std::str::FromStr for Crs {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (authority, code) = s.split_once(':').unwrap_or(("EPSG", s));
        let code: u32 = code
            .parse()
            .map_err(|_| crate::error::Error::UnknownCrs {
                authority: authority.to_string(),
                code: 0,
            })?;
        match authority.to_ascii_uppercase().as_str() {
            "EPSG" => Ok(Crs::epsg(code)),
            other => Err(crate::error::Error::UnknownCrs {
                authority: other.to_string(),
                code,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_constants() {
        assert!(!Crs::EPSG_4326.is_projected());
        assert!(Crs::EPSG_3857.is_projected());
        assert_eq!(Crs::EPSG_4326.to_string(), "EPSG:4326");
    }

    #[test]
    fn parses_epsg_strings() {
        assert_eq!("EPSG:3857".parse::<Crs>().unwrap(), Crs::EPSG_3857);
        assert_eq!("4326".parse::<Crs>().unwrap(), Crs::EPSG_4326);
        assert!("bogus:xyz".parse::<Crs>().is_err());
    }
}
