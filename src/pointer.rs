//! JSON pointer addresses into the contract document.
//!
//! Every model node carries the pointer to its position in the source
//! document, and every later stage keys its maps by that pointer. Equality
//! and hashing are structural over the segment sequence, so the same logical
//! location always lands on the same map entry no matter how many times it
//! was derived.
use std::fmt;
use std::str::FromStr;

fn quote_segment(v: &str) -> String {
    v.replace('~', "~0").replace('/', "~1")
}

fn unquote_segment(v: &str) -> String {
    v.replace("~1", "/").replace("~0", "~")
}

#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    /// The empty pointer; renders as `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Derive the pointer one segment below `self`.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        JsonPointer { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Parse the textual form. A leading `#` (the fragment form `$ref`
    /// values use) is stripped; `~1`/`~0` unescape to `/`/`~`.
    pub fn parse(v: &str) -> Self {
        let v = v.strip_prefix('#').unwrap_or(v);
        JsonPointer {
            segments: v
                .split('/')
                .filter(|c| !c.is_empty())
                .map(unquote_segment)
                .collect(),
        }
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", quote_segment(segment))?;
        }
        Ok(())
    }
}

impl fmt::Debug for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsonPointer({self})")
    }
}

impl FromStr for JsonPointer {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

// ------------------------------- Tests ------------------------------------ //
