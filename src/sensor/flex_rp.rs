use embassy_rp::gpio::{Flex, Pull};

use crate::sensor::FlexPin;

impl FlexPin for Flex<'_> {
    fn set_as_input(&mut self) {
        Flex::set_pull(self, Pull::None);
        Flex::set_as_input(self);
    }

    fn set_as_output(&mut self) {
        Flex::set_as_output(self);
    }
}
