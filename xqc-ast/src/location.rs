use std::ops::Range;

/// Index of a source location in a [`LocationMap`].
///
/// Expression nodes carry one of these rather than a line/column pair; the
/// position is only looked up when something needs to be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LocationId(u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub span: Range<usize>,
}

/// Per compile unit arena of source locations.
#[derive(Debug, Clone, Default)]
pub struct LocationMap {
    locations: Vec<Location>,
}

impl LocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, location: Location) -> LocationId {
        // consecutive nodes often start at the same token
        if let Some(last) = self.locations.last() {
            if *last == location {
                return LocationId((self.locations.len() - 1) as u32);
            }
        }
        self.locations.push(location);
        LocationId((self.locations.len() - 1) as u32)
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
