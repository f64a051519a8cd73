// Panel renderer - Lays a snapshot out across the black and highlight planes
use crate::domain::snapshot::{CONNECTION_ICON_MARKER, NOT_AVAILABLE};
use crate::presentation::plane::Plane;
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_6X13_BOLD, FONT_9X18};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Ellipse, Line, PrimitiveStyle};
use embedded_graphics::text::{Baseline, Text};

/// 2.9" tri-colour panel in landscape orientation.
pub const PANEL_WIDTH: u32 = 296;
pub const PANEL_HEIGHT: u32 = 128;

/// Number of slots in the render tuple.
pub const FIELD_COUNT: usize = 10;

/// Port the settings form listens on, shown on the panel.
pub const SETTINGS_PORT: u16 = 5000;

/// Status value that moves the status line and glyph onto the highlight plane.
const OFFLINE_STATUS: &str = "OFFLINE";

const STATUS_POSITION: Point = Point::new(245, 40);
const GLYPH_POSITION: Point = Point::new(245, 0);

/// Which physical colour a piece of content is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneKind {
    Black,
    Highlight,
}

/// Plane for the status text and connectivity glyph.
pub fn status_plane(status: &str) -> PlaneKind {
    if status == OFFLINE_STATUS {
        PlaneKind::Highlight
    } else {
        PlaneKind::Black
    }
}

/// The fixed-order render tuple. Missing trailing slots are always `N/A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFields {
    pub devices_online: String,
    pub important_down: String,
    pub download_label: String,
    pub upload_label: String,
    pub download: String,
    pub upload: String,
    pub status: String,
    pub connection_icon: String,
    pub ip: String,
    pub uptime: String,
}

impl RenderFields {
    /// Take up to ten values in order, padding the rest with `N/A`.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut slots = values
            .into_iter()
            .chain(std::iter::repeat_with(|| NOT_AVAILABLE.to_string()))
            .take(FIELD_COUNT);
        let mut next = || slots.next().unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            devices_online: next(),
            important_down: next(),
            download_label: next(),
            upload_label: next(),
            download: next(),
            upload: next(),
            status: next(),
            connection_icon: next(),
            ip: next(),
            uptime: next(),
        }
    }
}

/// The three text sizes used on the panel.
#[derive(Clone, Copy)]
pub struct Fonts {
    pub large: &'static MonoFont<'static>,
    pub medium: &'static MonoFont<'static>,
    pub small: &'static MonoFont<'static>,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            large: &FONT_9X18,
            medium: &FONT_6X13_BOLD,
            small: &FONT_6X10,
        }
    }
}

#[derive(Clone, Default)]
pub struct Renderer {
    fonts: Fonts,
}

impl Renderer {
    pub fn new(fonts: Fonts) -> Self {
        Self { fonts }
    }

    /// Draw `fields` onto both planes. Static labels go black, values go highlight.
    pub fn render(&self, fields: &RenderFields, black: &mut Plane, highlight: &mut Plane) {
        let Fonts { large, medium, small } = self.fonts;

        draw_text(black, "Devices Online:", Point::new(30, 0), medium);
        draw_text(black, "Important Devices Down:", Point::new(30, 14), medium);
        draw_text(black, &fields.download_label, Point::new(2, 38), large);
        draw_text(black, &fields.upload_label, Point::new(2, 58), large);
        draw_text(black, "Uptime:", Point::new(2, 78), large);

        draw_text(highlight, &fields.download, Point::new(90, 38), large);
        draw_text(highlight, &fields.upload, Point::new(66, 58), large);
        draw_text(highlight, &format!("{}%", fields.uptime), Point::new(66, 78), large);
        draw_text(highlight, &fields.devices_online, Point::new(147, 0), medium);
        draw_text(highlight, &fields.important_down, Point::new(210, 14), medium);

        let status_target = match status_plane(&fields.status) {
            PlaneKind::Highlight => &mut *highlight,
            PlaneKind::Black => &mut *black,
        };
        draw_text(status_target, &fields.status, STATUS_POSITION, small);
        self.draw_connection_glyph(status_target, &fields.connection_icon);

        draw_text(black, "Settings:", Point::new(2, 110), medium);
        draw_text(
            highlight,
            &format!("http://{}:{}", fields.ip, SETTINGS_PORT),
            Point::new(63, 110),
            medium,
        );
    }

    fn draw_connection_glyph(&self, target: &mut Plane, marker: &str) {
        if marker != CONNECTION_ICON_MARKER {
            draw_text(target, marker, GLYPH_POSITION, self.fonts.medium);
            return;
        }

        // Globe: outline, one meridian, equator and two parallels
        let outline = PrimitiveStyle::with_stroke(BinaryColor::On, 2);
        let thin = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
        let origin = GLYPH_POSITION + Point::new(3, 2);

        Circle::new(origin, 36).into_styled(outline).draw(target).ok();
        Ellipse::new(origin + Point::new(11, 0), Size::new(14, 36))
            .into_styled(thin)
            .draw(target)
            .ok();
        for (dy, inset) in [(9, 4), (18, 0), (27, 4)] {
            Line::new(
                origin + Point::new(inset, dy),
                origin + Point::new(35 - inset, dy),
            )
            .into_styled(thin)
            .draw(target)
            .ok();
        }
    }
}

fn draw_text(target: &mut Plane, text: &str, position: Point, font: &'static MonoFont<'static>) {
    let style = MonoTextStyle::new(font, BinaryColor::On);
    Text::with_baseline(text, position, style, Baseline::Top)
        .draw(target)
        .ok();
}
