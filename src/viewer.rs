use anyhow::{anyhow, Result};
use egui::{ColorImage, Key, TextureHandle, TextureOptions};
use eframe::{App, Frame};
use image::DynamicImage;

use crate::display::Display;

#[derive(Default)]
pub struct WindowDisplay {
    queued: Vec<DynamicImage>,
}

impl WindowDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for WindowDisplay {
    fn show(&mut self, image: &DynamicImage) -> Result<()> {
        self.queued.push(image.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.queued.is_empty() {
            return Ok(());
        }
        let images = std::mem::take(&mut self.queued);
        let (width, height) = images
            .iter()
            .fold((320.0f32, 240.0f32), |(w, h), image| {
                (w.max(image.width() as f32), h.max(image.height() as f32))
            });

        let viewport = egui::ViewportBuilder::default()
            .with_title("fancymages")
            .with_inner_size([width + 32.0, height + 72.0]);
        let options = eframe::NativeOptions {
            viewport,
            ..Default::default()
        };

        eframe::run_native(
            "fancymages",
            options,
            Box::new(move |_cc| Box::new(ViewerApp::new(images))),
        )
        .map_err(|err| anyhow!("viewer failed: {err}"))
    }
}

struct ViewerApp {
    images: Vec<DynamicImage>,
    textures: Vec<Option<TextureHandle>>,
    index: usize,
}

impl ViewerApp {
    fn new(images: Vec<DynamicImage>) -> Self {
        let textures = images.iter().map(|_| None).collect();
        Self {
            images,
            textures,
            index: 0,
        }
    }

    fn texture(&mut self, ctx: &egui::Context) -> Option<&TextureHandle> {
        let index = self.index;
        let image = self.images.get(index)?;
        let slot = self.textures.get_mut(index)?;
        if slot.is_none() {
            let rgba = image.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let color = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
            *slot = Some(ctx.load_texture(format!("snapshot-{index}"), color, TextureOptions::LINEAR));
        }
        slot.as_ref()
    }
}

impl App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        let count = self.images.len();
        let (next, previous) = ctx.input(|input| {
            (
                input.key_pressed(Key::ArrowRight),
                input.key_pressed(Key::ArrowLeft),
            )
        });
        if next && self.index + 1 < count {
            self.index += 1;
        }
        if previous && self.index > 0 {
            self.index -= 1;
        }

        egui::TopBottomPanel::top("viewer_nav").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(self.index > 0, egui::Button::new("◀"))
                    .clicked()
                {
                    self.index -= 1;
                }
                ui.label(format!("{} / {}", self.index + 1, count));
                if ui
                    .add_enabled(self.index + 1 < count, egui::Button::new("▶"))
                    .clicked()
                {
                    self.index += 1;
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(texture) = self.texture(ctx) else {
                return;
            };
            let sized = egui::load::SizedTexture::new(texture.id(), texture.size_vec2());
            egui::ScrollArea::both().show(ui, |ui| {
                ui.image(sized);
            });
        });
    }
}
