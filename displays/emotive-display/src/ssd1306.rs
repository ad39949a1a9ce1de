//! SSD1306 OLED Display Driver
//!
//! Driver for 128x64 SSD1306-based OLED displays via I2C. Accepts whole
//! packed frames and streams them page by page.

use embedded_hal_async::i2c::I2c;

use emotive_core::traits::DisplaySink;

use crate::bitmap::page_from_rows;

/// Default I2C address (0x3D on modules with the address jumper set)
pub const DEFAULT_ADDRESS: u8 = 0x3C;

/// Display dimensions
pub const WIDTH: usize = 128;
pub const HEIGHT: usize = 64;
const PAGES: usize = HEIGHT / 8;

/// Bytes in one packed 128x64 frame
pub const FRAME_BYTES: usize = WIDTH * HEIGHT / 8;

/// I2C control bytes
const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;

/// SSD1306 commands
#[allow(dead_code)]
mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_INVERSE: u8 = 0xA7;
    pub const RESUME_RAM: u8 = 0xA4;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_MEMORY_MODE: u8 = 0x20;
    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;
    pub const SET_PAGE_ADDR: u8 = 0xB0;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_SEG_NORMAL: u8 = 0xA0;
    pub const SET_SEG_REMAP: u8 = 0xA1;
    pub const SET_COM_SCAN_INC: u8 = 0xC0;
    pub const SET_COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
}

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError<E> {
    /// I2C transfer failed
    Communication(E),
    /// Frame is not 128x64
    DimensionMismatch,
}

/// Panel settings applied by [`Ssd1306::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelConfig {
    /// 7-bit I2C address
    pub address: u8,
    /// Contrast (0-255)
    pub contrast: u8,
    /// Rotate by 180 degrees
    pub flip: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            contrast: 0xCF,
            flip: false,
        }
    }
}

/// SSD1306 OLED driver
pub struct Ssd1306<I2C> {
    i2c: I2C,
    config: PanelConfig,
    /// One page of column bytes, prefixed with the data control byte
    page: [u8; WIDTH + 1],
}

impl<I2C: I2c> Ssd1306<I2C> {
    /// Create a new SSD1306 driver
    pub fn new(i2c: I2C, config: PanelConfig) -> Self {
        Self {
            i2c,
            config,
            page: [0; WIDTH + 1],
        }
    }

    /// Panel settings
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Initialize the display
    ///
    /// Safe to call again after a bus error to bring the panel back.
    pub async fn init(&mut self) -> Result<(), DisplayError<I2C::Error>> {
        let (seg, com) = if self.config.flip {
            (cmd::SET_SEG_NORMAL, cmd::SET_COM_SCAN_INC)
        } else {
            (cmd::SET_SEG_REMAP, cmd::SET_COM_SCAN_DEC)
        };

        let init_cmds: [u8; 25] = [
            cmd::DISPLAY_OFF,
            cmd::SET_CLOCK_DIV,
            0x80, // Default clock
            cmd::SET_MUX_RATIO,
            (HEIGHT - 1) as u8,
            cmd::SET_DISPLAY_OFFSET,
            0x00,
            cmd::SET_START_LINE,
            cmd::SET_CHARGE_PUMP,
            0x14, // Enable charge pump
            cmd::SET_MEMORY_MODE,
            0x02, // Page addressing
            seg,
            com,
            cmd::SET_COM_PINS,
            0x12, // Alternative COM config
            cmd::SET_CONTRAST,
            self.config.contrast,
            cmd::SET_PRECHARGE,
            0xF1,
            cmd::SET_VCOM_DETECT,
            0x40,
            cmd::RESUME_RAM,
            cmd::SET_NORMAL,
            cmd::DISPLAY_ON,
        ];

        for &c in init_cmds.iter() {
            self.command(c).await?;
        }

        Ok(())
    }

    /// Send a command to the display
    async fn command(&mut self, cmd: u8) -> Result<(), DisplayError<I2C::Error>> {
        self.i2c
            .write(self.config.address, &[CONTROL_COMMAND, cmd])
            .await
            .map_err(DisplayError::Communication)
    }

    /// Write a packed row-major frame to the panel
    pub async fn draw_frame(
        &mut self,
        frame: &[u8],
        width: u16,
        height: u16,
    ) -> Result<(), DisplayError<I2C::Error>> {
        if width as usize != WIDTH || height as usize != HEIGHT || frame.len() != FRAME_BYTES {
            return Err(DisplayError::DimensionMismatch);
        }

        for page in 0..PAGES {
            self.command(cmd::SET_PAGE_ADDR | page as u8).await?;
            self.command(cmd::SET_LOW_COLUMN).await?;
            self.command(cmd::SET_HIGH_COLUMN).await?;

            self.page[0] = CONTROL_DATA;
            page_from_rows(frame, WIDTH, HEIGHT, page, &mut self.page[1..]);
            self.i2c
                .write(self.config.address, &self.page)
                .await
                .map_err(DisplayError::Communication)?;
        }

        Ok(())
    }

    /// Blank the panel RAM
    pub async fn clear(&mut self) -> Result<(), DisplayError<I2C::Error>> {
        self.draw_frame(&[0; FRAME_BYTES], WIDTH as u16, HEIGHT as u16)
            .await
    }

    /// Set display contrast (0-255)
    pub async fn set_contrast(&mut self, contrast: u8) -> Result<(), DisplayError<I2C::Error>> {
        self.command(cmd::SET_CONTRAST).await?;
        self.command(contrast).await?;
        self.config.contrast = contrast;
        Ok(())
    }

    /// Turn display on/off
    pub async fn set_display_on(&mut self, on: bool) -> Result<(), DisplayError<I2C::Error>> {
        if on {
            self.command(cmd::DISPLAY_ON).await
        } else {
            self.command(cmd::DISPLAY_OFF).await
        }
    }

    /// Invert display colors
    pub async fn set_inverted(&mut self, inverted: bool) -> Result<(), DisplayError<I2C::Error>> {
        if inverted {
            self.command(cmd::SET_INVERSE).await
        } else {
            self.command(cmd::SET_NORMAL).await
        }
    }
}

impl<I2C: I2c> DisplaySink for Ssd1306<I2C> {
    type Error = DisplayError<I2C::Error>;

    async fn push(&mut self, buffer: &[u8], width: u16, height: u16) -> Result<(), Self::Error> {
        self.draw_frame(buffer, width, height).await
    }
}
