//! Caps/Num/Scroll lock indicators.

use super::text::{TextOptions, draw_row};
use crate::config::KeyboardProperties;
use crate::error::MetricError;
use crate::sources::{LockKeys, SystemProbe};
use crate::tile::Tile;

pub struct KeyboardWidget {
    properties: KeyboardProperties,
    options: TextOptions,
    state: Option<LockKeys>,
}

impl KeyboardWidget {
    pub fn new(properties: KeyboardProperties) -> Self {
        Self {
            options: properties.text_options(),
            properties,
            state: None,
        }
    }

    pub const fn properties(&self) -> &KeyboardProperties {
        &self.properties
    }

    pub const fn state(&self) -> Option<LockKeys> {
        self.state
    }

    pub fn sample(&mut self, probe: &mut dyn SystemProbe) -> Result<(), MetricError> {
        self.state = Some(probe.lock_keys()?);
        Ok(())
    }

    pub fn render(&self, tile: &mut Tile) {
        let Some(keys) = self.state else {
            return;
        };
        let p = &self.properties;
        let items = [
            self.indicator(keys.caps, &p.caps_lock_on, &p.caps_lock_off),
            self.indicator(keys.num, &p.num_lock_on, &p.num_lock_off),
            self.indicator(keys.scroll, &p.scroll_lock_on, &p.scroll_lock_off),
        ];
        let area = self.options.content_area(tile.width(), tile.height());
        draw_row(tile, &items, p.spacing, &self.options, area);
    }

    fn indicator<'a>(&self, on: bool, on_text: &'a str, off_text: &'a str) -> (&'a str, u8) {
        if on {
            (on_text, self.properties.indicator_color_on)
        } else {
            (off_text, self.properties.indicator_color_off)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HorizontalAlign, VerticalAlign};

    struct Locks(LockKeys);

    impl SystemProbe for Locks {
        fn lock_keys(&mut self) -> Result<LockKeys, MetricError> {
            Ok(self.0)
        }
    }

    fn left_aligned() -> KeyboardProperties {
        KeyboardProperties {
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            ..KeyboardProperties::default()
        }
    }

    #[test]
    fn test_nothing_before_first_sample() {
        let widget = KeyboardWidget::new(KeyboardProperties::default());
        let mut tile = Tile::new(60, 12, 0);
        widget.render(&mut tile);
        assert_eq!(tile.foreground_count(), 0);
    }

    #[test]
    fn test_all_off_with_default_text_is_blank() {
        let mut widget = KeyboardWidget::new(KeyboardProperties::default());
        widget.sample(&mut Locks(LockKeys::default())).unwrap();
        let mut tile = Tile::new(60, 12, 0);
        widget.render(&mut tile);

        assert_eq!(tile.foreground_count(), 0, "Default off labels are empty");
    }

    #[test]
    fn test_on_and_off_colors() {
        let props = KeyboardProperties {
            caps_lock_off: "caps".to_owned(),
            ..left_aligned()
        };
        let mut on = KeyboardWidget::new(props.clone());
        on.sample(&mut Locks(LockKeys { caps: true, num: false, scroll: false })).unwrap();
        let mut off = KeyboardWidget::new(props);
        off.sample(&mut Locks(LockKeys::default())).unwrap();

        let mut tile = Tile::new(60, 12, 0);
        on.render(&mut tile);
        let (x0, y0, ..) = tile.foreground_bounds().unwrap();
        let lit = (y0..12).flat_map(|y| (x0..60).map(move |x| (x, y))).find(|&(x, y)| tile.is_foreground(x, y));
        let (x, y) = lit.unwrap();
        assert_eq!(tile.pixel(x, y), Some(255), "Active indicator in the on color");

        let mut tile = Tile::new(60, 12, 0);
        off.render(&mut tile);
        let (x0, y0, ..) = tile.foreground_bounds().unwrap();
        let dim = (y0..12).flat_map(|y| (x0..60).map(move |x| (x, y))).find(|&(x, y)| tile.is_foreground(x, y));
        let (x, y) = dim.unwrap();
        assert_eq!(tile.pixel(x, y), Some(80), "Inactive indicator in the off color");
    }

    #[test]
    fn test_unavailable_keeps_last_state() {
        struct NoLeds;
        impl SystemProbe for NoLeds {}

        let mut widget = KeyboardWidget::new(KeyboardProperties::default());
        let keys = LockKeys { caps: false, num: true, scroll: false };
        widget.sample(&mut Locks(keys)).unwrap();

        assert!(widget.sample(&mut NoLeds).is_err());
        assert_eq!(widget.state(), Some(keys));
    }
}
