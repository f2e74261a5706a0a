//! Inky Impression panel models and the driver facade
//!
//! A [`Model`] is plain data: geometry, controller and palette source.
//! [`PanelDriver`] composes it with a frame buffer, the ditherer and the
//! update protocol.

use crate::config::{ColorMode, DriverConfig};
use crate::dither::dither_with;
use crate::epd::{Controller, Interface, UpdateProtocol, UpdateReport, UpdateState};
use crate::error::{Error, Result};
use crate::framebuffer::FrameBuffer;
use crate::palette::{
    AC073TC1_SATURATED_PALETTE, Color, DESATURATED_PALETTE, MONO_PALETTE, Palette,
    PaletteProvider, UC8159_SATURATED_PALETTE,
};
use crate::raster::{RgbaImage, decode_png};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use log::{debug, info};

/// A concrete panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Model {
    pub name: &'static str,
    pub width: u16,
    pub height: u16,
    pub controller: Controller,
    pub palette: PaletteProvider,
    /// Row order of the standard mounting
    pub v_flip: bool,
}

pub const IMPRESSION_5_7: Model = Model {
    name: "Inky Impression 5.7\"",
    width: 600,
    height: 448,
    controller: Controller::Uc8159,
    palette: PaletteProvider::Blend {
        saturated: &UC8159_SATURATED_PALETTE,
        desaturated: &DESATURATED_PALETTE,
    },
    v_flip: true,
};

pub const IMPRESSION_4_0: Model = Model {
    name: "Inky Impression 4\"",
    width: 640,
    height: 400,
    controller: Controller::Uc8159,
    palette: PaletteProvider::Blend {
        saturated: &UC8159_SATURATED_PALETTE,
        desaturated: &DESATURATED_PALETTE,
    },
    v_flip: true,
};

pub const IMPRESSION_7_3: Model = Model {
    name: "Inky Impression 7.3\"",
    width: 800,
    height: 480,
    controller: Controller::Ac073tc1,
    palette: PaletteProvider::Blend {
        saturated: &AC073TC1_SATURATED_PALETTE,
        desaturated: &DESATURATED_PALETTE,
    },
    v_flip: true,
};

impl Model {
    pub const ALL: [Model; 3] = [IMPRESSION_5_7, IMPRESSION_4_0, IMPRESSION_7_3];

    /// Palette a driver with `config` quantizes against
    pub fn palette_for(&self, config: &DriverConfig) -> Palette {
        match config.color_mode {
            ColorMode::Mono => PaletteProvider::Fixed(&MONO_PALETTE).palette(config.saturation),
            _ => self.palette.palette(config.saturation),
        }
    }
}

/// Driver for one panel: draw into the frame buffer, then [`Self::show`]
pub struct PanelDriver<SPI, BUSY, DC, RST> {
    model: Model,
    config: DriverConfig,
    palette: Palette,
    framebuffer: FrameBuffer,
    border: Color,
    protocol: UpdateProtocol<SPI, BUSY, DC, RST>,
}

impl<SPI, BUSY, DC, RST> PanelDriver<SPI, BUSY, DC, RST>
where
    SPI: SpiDevice,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
{
    /// Create a driver. Fails for colour modes or geometry the panel's
    /// controller cannot drive. No bus traffic happens until the first show.
    pub fn new(
        model: Model,
        interface: Interface<SPI, BUSY, DC, RST>,
        config: DriverConfig,
    ) -> Result<Self> {
        config.validate()?;
        // Geometry is checked here rather than on the first show
        model
            .controller
            .init_sequence(model.width, model.height, Color::Black)?;

        let palette = model.palette_for(&config);
        // All device slots are writable; dithering only produces the palette's
        let framebuffer =
            FrameBuffer::new(model.width as usize, model.height as usize, Color::SLOTS);
        let protocol = UpdateProtocol::new(
            interface,
            model.controller,
            model.width,
            model.height,
            config.busy_timeout_ms,
        );

        info!(
            "Panel: {} {}x{} ({}, {} colours)",
            model.name,
            model.width,
            model.height,
            model.controller.name(),
            palette.len()
        );

        Ok(Self {
            model,
            config,
            palette,
            framebuffer,
            border: Color::Black,
            protocol,
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn width(&self) -> usize {
        self.framebuffer.width()
    }

    pub fn height(&self) -> usize {
        self.framebuffer.height()
    }

    /// Palette images are dithered against; an entry's position is its slot
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Mutable frame buffer, e.g. as an embedded-graphics `DrawTarget`
    pub fn framebuffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.framebuffer
    }

    pub fn border(&self) -> Color {
        self.border
    }

    pub fn state(&self) -> UpdateState {
        self.protocol.state()
    }

    /// Set a single pixel to a device colour index (0..8)
    pub fn set_pixel(&mut self, x: usize, y: usize, index: u8) -> Result<()> {
        self.framebuffer.set(x, y, index)
    }

    /// Set the border colour from a device colour index (0..8)
    pub fn set_border(&mut self, index: u8) -> Result<()> {
        self.border = Color::try_from(index)?;
        debug!("Panel: border {:?}", self.border);
        Ok(())
    }

    /// Dither a raster the size of the panel into the frame buffer
    pub fn load_image<D: AsRef<[u8]>>(&mut self, image: &RgbaImage<D>) -> Result<()> {
        if image.width() != self.width() || image.height() != self.height() {
            return Err(Error::RasterSize {
                len: image.as_bytes().len(),
                width: self.width(),
                height: self.height(),
            });
        }

        let framebuffer = &mut self.framebuffer;
        dither_with(image, &self.palette, self.config.dither, |q| {
            // Palette indices are always valid device slots
            let _ = framebuffer.set(q.x, q.y, q.index);
        })?;
        debug!("Panel: image loaded (dither {})", self.config.dither);
        Ok(())
    }

    /// Decode a PNG and load it. Needs the `png` feature.
    pub fn load_png(&mut self, png_data: &[u8]) -> Result<()> {
        let image = decode_png(png_data)?;
        self.load_image(&image)
    }

    /// Send the frame buffer and refresh the panel.
    ///
    /// With `busy_wait` unset this returns once the refresh is dispatched;
    /// see [`Self::finish`].
    pub fn show<DELAY: DelayNs>(&mut self, delay: &mut DELAY, busy_wait: bool) -> Result<UpdateReport> {
        let payload = self
            .framebuffer
            .to_wire(self.config.h_flip, self.config.v_flip);
        self.protocol.update(delay, self.border, &payload, busy_wait)
    }

    /// Complete a refresh dispatched by a non-blocking [`Self::show`]
    pub fn finish<DELAY: DelayNs>(&mut self, delay: &mut DELAY) -> Result<UpdateReport> {
        self.protocol.finish(delay)
    }

    /// Check if the panel is still busy refreshing
    pub fn is_busy(&mut self) -> Result<bool> {
        self.protocol.is_busy()
    }

    /// Give the bus interface back
    pub fn release(self) -> Interface<SPI, BUSY, DC, RST> {
        self.protocol.release()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::epd::WaitOutcome;
    use crate::mock::{Expect, Lines, MockDelay, Wait};
    use crate::palette::Rgb;
    use embedded_graphics_core::Pixel;
    use embedded_graphics_core::draw_target::DrawTarget;
    use embedded_graphics_core::geometry::Point;
    use embedded_hal_mock::eh1::digital::Mock as PinMock;
    use embedded_hal_mock::eh1::spi::Mock as SpiMock;

    type MockDriver = PanelDriver<SpiMock<u8>, PinMock, PinMock, PinMock>;

    const READY: [Wait; 2] = [Wait::ReadyAfter(0), Wait::ReadyAfter(0)];

    fn driver(model: Model, config: DriverConfig, expect: &Expect) -> (MockDriver, Lines) {
        let (interface, lines) = expect.build();
        (PanelDriver::new(model, interface, config).unwrap(), lines)
    }

    fn geometry(model: &Model) -> (u16, u16) {
        (model.width, model.height)
    }

    fn solid(width: usize, height: usize, color: Rgb) -> Vec<u8> {
        (0..width * height).flat_map(|_| [color.r, color.g, color.b, 255]).collect()
    }

    #[test]
    fn test_model_palettes() {
        let config = DriverConfig::default();
        for model in Model::ALL {
            assert_eq!(model.palette_for(&config).len(), 7);
        }

        let mono = DriverConfig {
            color_mode: ColorMode::Mono,
            ..config
        };
        assert_eq!(IMPRESSION_7_3.palette_for(&mono).as_slice(), &MONO_PALETTE);
    }

    #[test]
    fn test_rejects_unsupported_colour_mode() {
        let (interface, mut lines) = Expect::new().build();
        let config = DriverConfig {
            color_mode: ColorMode::Red,
            ..DriverConfig::default()
        };
        assert!(matches!(
            PanelDriver::new(IMPRESSION_5_7, interface, config),
            Err(Error::UnsupportedConfiguration(_))
        ));
        lines.done();
    }

    #[test]
    fn test_rejects_mismatched_controller_geometry() {
        let (interface, mut lines) = Expect::new().build();
        let model = Model {
            width: 800,
            height: 480,
            ..IMPRESSION_5_7
        };
        assert!(matches!(
            PanelDriver::new(model, interface, DriverConfig::default()),
            Err(Error::UnsupportedConfiguration(_))
        ));
        lines.done();
    }

    #[test]
    fn test_set_pixel_bounds() {
        let (mut inky, mut lines) = driver(IMPRESSION_5_7, DriverConfig::default(), &Expect::new());
        assert!(inky.set_pixel(599, 447, 6).is_ok());
        assert_eq!(inky.framebuffer().get(599, 447), Some(6));
        assert!(matches!(
            inky.set_pixel(600, 0, 0),
            Err(Error::PixelOutOfRange { .. })
        ));
        assert!(matches!(
            inky.set_pixel(0, 448, 0),
            Err(Error::PixelOutOfRange { .. })
        ));
        assert_eq!(
            inky.set_pixel(0, 0, 8),
            Err(Error::ColorOutOfRange { index: 8, slots: 8 })
        );
        lines.done();
    }

    #[test]
    fn test_clean_slot_is_writable() {
        let (mut inky, mut lines) = driver(IMPRESSION_7_3, DriverConfig::default(), &Expect::new());
        inky.set_pixel(0, 0, Color::Clean as u8).unwrap();
        assert_eq!(inky.framebuffer().get(0, 0), Some(7));

        inky.framebuffer_mut()
            .draw_iter([Pixel(Point::new(1, 1), Color::Clean)])
            .unwrap();
        assert_eq!(inky.framebuffer().get(1, 1), Some(Color::Clean as u8));
        lines.done();
    }

    #[test]
    fn test_set_border() {
        let (mut inky, mut lines) = driver(IMPRESSION_4_0, DriverConfig::default(), &Expect::new());
        assert_eq!(inky.border(), Color::Black);
        inky.set_border(Color::Orange as u8).unwrap();
        assert_eq!(inky.border(), Color::Orange);
        assert_eq!(
            inky.set_border(8),
            Err(Error::ColorOutOfRange { index: 8, slots: 8 })
        );
        assert_eq!(inky.border(), Color::Orange);
        lines.done();
    }

    #[test]
    fn test_default_border_is_black() {
        let model = IMPRESSION_5_7;
        let payload = vec![0; 600 * 448 / 2];
        let mut expect = Expect::new();
        expect
            .setup()
            .dispatch(model.controller, geometry(&model), Color::Black, &payload, READY)
            .complete(model.controller, READY);
        let (mut inky, mut lines) = driver(model, DriverConfig::default(), &expect);

        // CDI carries border 0 over the default polarity and interval bits
        let init = model.controller.init_sequence(600, 448, inky.border()).unwrap();
        let cdi = init.iter().find(|r| r.command == 0x50).unwrap();
        assert_eq!(cdi.data.as_slice(), &[0x17]);

        inky.show(&mut MockDelay::default(), true).unwrap();
        lines.done();
    }

    #[test]
    fn test_load_image_size_mismatch() {
        let (mut inky, mut lines) = driver(IMPRESSION_7_3, DriverConfig::default(), &Expect::new());
        let data = solid(2, 2, Rgb::new(0, 0, 0));
        let image = RgbaImage::new(2, 2, &data).unwrap();
        assert_eq!(
            inky.load_image(&image),
            Err(Error::RasterSize {
                len: 16,
                width: 800,
                height: 480
            })
        );
        lines.done();
    }

    #[test]
    fn test_load_solid_colours() {
        let config = DriverConfig {
            saturation: 0.0,
            ..DriverConfig::default()
        };
        let (mut inky, mut lines) = driver(IMPRESSION_5_7, config, &Expect::new());

        // At zero saturation the palette is the ideal table, so pure
        // colours carry no error to diffuse
        for color in [Color::Green, Color::Blue, Color::Yellow] {
            let rgb = DESATURATED_PALETTE[color as usize];
            let data = solid(600, 448, rgb);
            let image = RgbaImage::new(600, 448, &data).unwrap();
            inky.load_image(&image).unwrap();
            assert!(inky.framebuffer().as_slice().iter().all(|&i| i == color as u8));
        }
        lines.done();
    }

    #[test]
    fn test_mono_load_and_wire_format() {
        let model = IMPRESSION_7_3;
        let config = DriverConfig {
            color_mode: ColorMode::Mono,
            dither: 0.0,
            ..DriverConfig::default()
        };

        // Left half black, right half white: 400 pixels of slot 0 then 400
        // of slot 1 per row, two pixels per byte
        let row: Vec<u8> = [vec![0x00; 200], vec![0x11; 200]].concat();
        let payload = row.repeat(480);
        let mut expect = Expect::new();
        expect
            .setup()
            .dispatch(model.controller, geometry(&model), Color::Black, &payload, READY)
            .complete(model.controller, READY);
        let (mut inky, mut lines) = driver(model, config, &expect);
        assert_eq!(inky.palette().len(), 2);

        let data: Vec<u8> = (0..800 * 480)
            .flat_map(|i| if i % 800 < 400 { [0, 0, 0, 255] } else { [255, 255, 255, 255] })
            .collect();
        let image = RgbaImage::new(800, 480, &data).unwrap();
        inky.load_image(&image).unwrap();

        let report = inky.show(&mut MockDelay::default(), true).unwrap();
        assert!(!report.timed_out());
        assert_eq!(report.outcome(UpdateState::Refreshing), Some(WaitOutcome::Ready));
        lines.done();
    }

    #[test]
    fn test_show_orientation_and_border() {
        let model = IMPRESSION_5_7;
        let config = DriverConfig {
            v_flip: false,
            ..DriverConfig::default()
        };

        // Rows go out bottom-up, so (0, 0) opens the last row
        let mut payload = vec![0; 600 * 448 / 2];
        payload[447 * 600 / 2] = 0x40;
        let mut expect = Expect::new();
        expect
            .setup()
            .dispatch(model.controller, geometry(&model), Color::Blue, &payload, READY)
            .complete(model.controller, READY);
        let (mut inky, mut lines) = driver(model, config, &expect);

        inky.set_pixel(0, 0, Color::Red as u8).unwrap();
        inky.set_border(Color::Blue as u8).unwrap();
        inky.show(&mut MockDelay::default(), true).unwrap();
        assert_eq!(inky.state(), UpdateState::Idle);
        lines.done();
    }

    #[test]
    fn test_non_blocking_show() {
        let model = IMPRESSION_7_3;
        let config = DriverConfig {
            busy_timeout_ms: Some(100),
            ..DriverConfig::for_model(&model)
        };
        let payload = vec![0; 800 * 480 / 2];
        let mut expect = Expect::new();
        expect
            .setup()
            .dispatch(
                model.controller,
                geometry(&model),
                Color::Black,
                &payload,
                [Wait::TimedOut(1_000), Wait::TimedOut(400)],
            )
            .busy_read(false)
            .complete(model.controller, [Wait::TimedOut(100), Wait::TimedOut(400)]);
        let (mut inky, mut lines) = driver(model, config, &expect);
        let mut delay = MockDelay::default();

        inky.show(&mut delay, false).unwrap();
        assert_eq!(inky.state(), UpdateState::Refreshing);
        assert!(inky.is_busy().unwrap());

        let start = delay.now_ms();
        let report = inky.finish(&mut delay).unwrap();
        assert_eq!(report.outcome(UpdateState::Refreshing), Some(WaitOutcome::TimedOut));
        // overridden refresh ceiling plus the power off wait
        assert_eq!(delay.now_ms() - start, 100 + 400);
        assert_eq!(inky.state(), UpdateState::Idle);

        let interface = inky.release();
        assert!(interface.is_configured());
        lines.done();
    }

    #[cfg(feature = "png")]
    #[test]
    fn test_load_png() {
        let (mut inky, mut lines) = driver(IMPRESSION_5_7, DriverConfig::default(), &Expect::new());

        let data = solid(600, 448, Rgb::new(255, 255, 255));
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, 600, 448);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&data).unwrap();
        }

        inky.load_png(&png_data).unwrap();
        assert!(inky.framebuffer().as_slice().iter().all(|&i| i == Color::White as u8));
        lines.done();
    }

    #[cfg(not(feature = "png"))]
    #[test]
    fn test_load_png_needs_feature() {
        let (mut inky, mut lines) = driver(IMPRESSION_5_7, DriverConfig::default(), &Expect::new());
        assert_eq!(inky.load_png(&[]), Err(Error::MissingCapability("png")));
        lines.done();
    }
}
