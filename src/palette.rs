//! Fixed colour palette shared by every chart.

use crate::models::Site;
use plotters::style::RGBColor;
use serde::{Serialize, Serializer};
use std::fmt;

/// An opaque RGB colour, rendered as CSS `rgb(r, g, b)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn css(self) -> String {
        self.to_string()
    }

    pub fn to_plotters(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct SiteColors {
    pub all: Rgb,
    pub mefi: Rgb,
    pub askme: Rgb,
    pub meta: Rgb,
    pub fanfare: Rgb,
    pub music: Rgb,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Palette {
    pub white: Rgb,
    pub posts: Rgb,
    pub comments: Rgb,
    pub deleted: Rgb,
    pub users_new: Rgb,
    pub users_registered: Rgb,
    pub sites: SiteColors,
    /// Colours for categorical series, in assignment order.
    pub sequence: [Rgb; 7],
}

impl Palette {
    pub fn site(&self, site: Site) -> Rgb {
        match site {
            Site::All => self.sites.all,
            Site::Mefi => self.sites.mefi,
            Site::Askme => self.sites.askme,
            Site::Meta => self.sites.meta,
            Site::Fanfare => self.sites.fanfare,
            Site::Music => self.sites.music,
        }
    }

    /// Categorical colour for series `idx`, cycling through the sequence.
    #[inline]
    pub fn sequence_color(&self, idx: usize) -> Rgb {
        self.sequence[idx % self.sequence.len()]
    }
}

pub const COLORS: Palette = Palette {
    white: Rgb(255, 255, 255),
    posts: Rgb(153, 102, 255),
    comments: Rgb(75, 192, 192),
    deleted: Rgb(255, 99, 132),
    users_new: Rgb(75, 192, 192),
    users_registered: Rgb(174, 214, 229),
    sites: SiteColors {
        all: Rgb(51, 65, 85),
        mefi: Rgb(54, 162, 235),
        askme: Rgb(75, 192, 192),
        meta: Rgb(255, 159, 64),
        fanfare: Rgb(153, 102, 255),
        music: Rgb(255, 99, 132),
    },
    sequence: [
        Rgb(54, 162, 235),  // blue
        Rgb(255, 205, 86),  // yellow
        Rgb(255, 159, 64),  // orange
        Rgb(255, 99, 132),  // red
        Rgb(153, 102, 255), // purple
        Rgb(75, 192, 192),  // teal
        Rgb(201, 203, 207), // grey
    ],
};
