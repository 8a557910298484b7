//! PDF render engine: draws a [`DocumentLayout`] with printpdf.

use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Px,
};

use super::layout::{DocumentLayout, DrawOp, FontWeight, PageLayout};
use super::logo::PreparedLogo;
use super::DocumentError;

const MM_PER_INCH: f32 = 25.4;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

pub struct PdfRenderEngine;

impl PdfRenderEngine {
    /// Render every page of `layout`. `Logo` operations are skipped when no
    /// logo is given.
    pub fn render(
        layout: &DocumentLayout,
        logo: Option<&PreparedLogo>,
    ) -> Result<Vec<u8>, DocumentError> {
        let width = Mm(layout.geometry.width);
        let height = Mm(layout.geometry.height);
        let (doc, first_page, first_layer) =
            PdfDocument::new(layout.title.as_str(), width, height, "Contenido");

        let fonts = Fonts {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
        };

        for (index, page) in layout.pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) = doc.add_page(width, height, "Contenido");
                doc.get_page(page_index).get_layer(layer_index)
            };
            draw_page(&layer, page, layout.geometry.height, &fonts, logo);
        }

        Ok(doc.save_to_bytes()?)
    }
}

fn draw_page(
    layer: &PdfLayerReference,
    page: &PageLayout,
    page_height: f32,
    fonts: &Fonts,
    logo: Option<&PreparedLogo>,
) {
    // Layout y grows downwards, PDF y grows upwards.
    let flip = |y: f32| Mm(page_height - y);

    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                baseline,
                size,
                weight,
                text,
            } => {
                if !text.is_empty() {
                    layer.use_text(text.as_str(), *size, Mm(*x), flip(*baseline), fonts.get(*weight));
                }
            }
            DrawOp::Rule {
                x1,
                y1,
                x2,
                y2,
                thickness,
            } => {
                layer.set_outline_thickness(*thickness);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1), flip(*y1)), false),
                        (Point::new(Mm(*x2), flip(*y2)), false),
                    ],
                    is_closed: false,
                });
            }
            DrawOp::Frame {
                x,
                y,
                width,
                height,
                thickness,
            } => {
                layer.set_outline_thickness(*thickness);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x), flip(*y)), false),
                        (Point::new(Mm(x + width), flip(*y)), false),
                        (Point::new(Mm(x + width), flip(y + height)), false),
                        (Point::new(Mm(*x), flip(y + height)), false),
                    ],
                    is_closed: true,
                });
            }
            DrawOp::Logo {
                x,
                y,
                width,
                height,
            } => {
                if let Some(logo) = logo {
                    let dpi = logo.width_px() as f32 * MM_PER_INCH / width.max(f32::EPSILON);
                    logo_image(logo).add_to_layer(
                        layer.clone(),
                        ImageTransform {
                            translate_x: Some(Mm(*x)),
                            translate_y: Some(flip(y + height)),
                            dpi: Some(dpi),
                            ..Default::default()
                        },
                    );
                }
            }
        }
    }
}

/// The prepared JPEG goes into the PDF untouched, decoded by the viewer.
fn logo_image(logo: &PreparedLogo) -> Image {
    Image::from(ImageXObject {
        width: Px(logo.width_px() as usize),
        height: Px(logo.height_px() as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: false,
        image_data: logo.jpeg.clone(),
        image_filter: Some(ImageFilter::DCT),
        smask: None,
        clipping_bbox: None,
    })
}
