use crate::config::ViewKind;
use crate::controller::RunState;
use crate::model::{phase_info, BodyFrame, MoonFrame, Rgb, PHASES};
use crate::moon::{PhaseBrowser, PHASE_COUNT};
use crate::orbit::OrbitSim;
use crossterm::{
    cursor,
    event::{DisableFocusChange, EnableFocusChange},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::TAU;
use std::io::{self, Write};

pub const BG: Color = Color::Black;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: BG,
        }
    }
}

pub struct CellBuffer {
    pub w: u16,
    pub h: u16,
    pub cells: Vec<Cell>,
}

impl CellBuffer {
    pub fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }
    pub fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            bg,
            ..Cell::default()
        });
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const fn rgba(c: Rgb, a: u8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a,
        }
    }
}

/// Braille sub-pixel surface, 2x4 pixels per terminal cell. Pixels come out
/// roughly square on common fonts.
pub struct PixelCanvas {
    pub w: u32,
    pub h: u32,
    pub px: Vec<Pixel>,
}

impl PixelCanvas {
    pub fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    pub fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub fn clear(&mut self) {
        self.px.fill(Pixel::default());
    }
    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        (x < self.w && y < self.h).then(|| self.px[self.idx(x, y)])
    }

    pub fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }
        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };
        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }

    pub fn fill_disc(&mut self, cx: f64, cy: f64, r: f64, p: Pixel) {
        let ri = r.ceil() as i32;
        let (x0, y0) = (cx.round() as i32, cy.round() as i32);
        for dy in -ri..=ri {
            for dx in -ri..=ri {
                if (dx * dx + dy * dy) as f64 <= r * r {
                    self.blend_over(x0 + dx, y0 + dy, p);
                }
            }
        }
    }

    /// Dotted ellipse outline, one dot roughly every `spacing` pixels.
    pub fn dotted_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, spacing: f64, p: Pixel) {
        let approx_len = TAU * ((rx * rx + ry * ry) / 2.0).sqrt();
        let n = ((approx_len / spacing.max(1.0)) as usize).max(12);
        for i in 0..n {
            let a = i as f64 / n as f64 * TAU;
            let (s, c) = a.sin_cos();
            self.blend_over((cx + rx * c).round() as i32, (cy + ry * s).round() as i32, p);
        }
    }
}

/// Colour choice for one session; mono mode maps everything to greys.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub color: bool,
}

impl Palette {
    pub fn rgb(&self, c: Rgb) -> Color {
        if self.color {
            Color::Rgb {
                r: c.r,
                g: c.g,
                b: c.b,
            }
        } else {
            Color::White
        }
    }
    pub fn text(&self) -> Color {
        Color::White
    }
    pub fn dim(&self) -> Color {
        if self.color {
            Color::Rgb {
                r: 120,
                g: 130,
                b: 150,
            }
        } else {
            Color::Grey
        }
    }
    pub fn accent(&self) -> Color {
        if self.color {
            Color::Yellow
        } else {
            Color::White
        }
    }
}

pub struct Terminal {
    pub out: io::Stdout,
    pub cols: u16,
    pub rows: u16,
    pub prev: CellBuffer,
    pub cur: CellBuffer,
    pub canvas: PixelCanvas,
}

impl Terminal {
    pub fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            EnableFocusChange,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;

        let (cols, rows) = match terminal::enable_raw_mode().and_then(|_| terminal::size()) {
            Ok(size) => size,
            Err(e) => {
                // best effort: the original error is the one worth reporting
                let _ = terminal::disable_raw_mode();
                let _ = leave_screen(&mut out);
                return Err(e.into());
            }
        };
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(cols as u32 * 2, rows as u32 * 4),
        })
    }

    pub fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            EndSynchronizedUpdate
        )?;
        leave_screen(&mut self.out)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }
                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/// Undo everything `Terminal::begin` does to the screen. Raw mode is separate.
fn leave_screen(out: &mut impl Write) -> io::Result<()> {
    execute!(
        out,
        ResetColor,
        cursor::Show,
        EnableLineWrap,
        DisableFocusChange,
        LeaveAlternateScreen
    )
}

/* -----------------------------
   Braille encoding: 2x4 pixels -> U+2800..U+28FF
------------------------------ */

const BRAILLE_EMPTY: char = '\u{2800}';

fn braille_bit(dx: u32, dy: u32) -> u8 {
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

pub fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, pal: Palette, bg: Color) {
    for cy in 0..out.h as u32 {
        for cx in 0..out.w as u32 {
            let mut mask: u8 = 0;
            let (mut sr, mut sg, mut sb, mut ink) = (0u32, 0u32, 0u32, 0u32);

            for dy in 0..4 {
                for dx in 0..2 {
                    let Some(p) = canvas.get(cx * 2 + dx, cy * 4 + dy) else {
                        continue;
                    };
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sr += p.r as u32;
                        sg += p.g as u32;
                        sb += p.b as u32;
                        ink += 1;
                    }
                }
            }
            if mask == 0 {
                continue;
            }

            let ch = char::from_u32(0x2800 + mask as u32).unwrap_or(' ');
            let fg = pal.rgb(Rgb::new(
                (sr / ink) as u8,
                (sg / ink) as u8,
                (sb / ink) as u8,
            ));
            out.set(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

/* -----------------------------
   Text and boxes
------------------------------ */

pub fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

pub fn draw_centered(buf: &mut CellBuffer, x0: u16, w: u16, y: u16, s: &str, fg: Color) {
    let len = s.chars().count() as u16;
    let x = x0 + w.saturating_sub(len) / 2;
    draw_text(buf, x, y, s, fg, BG);
}

pub fn box_draw(buf: &mut CellBuffer, x0: u16, y0: u16, bw: u16, bh: u16, fg: Color) {
    if bw < 2 || bh < 2 {
        return;
    }
    let x1 = x0.saturating_add(bw - 1);
    let y1 = y0.saturating_add(bh - 1);
    for x in x0 + 1..x1 {
        buf.set(x, y0, Cell { ch: '─', fg, bg: BG });
        buf.set(x, y1, Cell { ch: '─', fg, bg: BG });
    }
    for y in y0 + 1..y1 {
        buf.set(x0, y, Cell { ch: '│', fg, bg: BG });
        buf.set(x1, y, Cell { ch: '│', fg, bg: BG });
    }
    buf.set(x0, y0, Cell { ch: '┌', fg, bg: BG });
    buf.set(x1, y0, Cell { ch: '┐', fg, bg: BG });
    buf.set(x0, y1, Cell { ch: '└', fg, bg: BG });
    buf.set(x1, y1, Cell { ch: '┘', fg, bg: BG });
}

/// Greedy word wrap; words longer than `width` are left whole.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

pub fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str, pal: Palette) {
    let bw = 60.min(buf.w.saturating_sub(4));
    let bh = 18.min(buf.h.saturating_sub(4));
    if bw < 10 || bh < 5 {
        return;
    }
    let x0 = (buf.w - bw) / 2;
    let y0 = (buf.h - bh) / 2;
    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            buf.set(x, y, Cell::default());
        }
    }
    box_draw(buf, x0, y0, bw, bh, pal.text());
    draw_text(buf, x0 + 2, y0 + 1, title, pal.accent(), BG);

    let mut yy = y0 + 3;
    for line in body.lines() {
        if yy >= y0 + bh - 1 {
            break;
        }
        draw_text(buf, x0 + 2, yy, line, pal.text(), BG);
        yy += 1;
    }
}

/* -----------------------------
   Star field
------------------------------ */

#[derive(Clone, Copy, Debug)]
pub struct Star {
    pub x: u16,
    pub y: u16,
    pub phase: f32,
    pub depth: f32,
}

pub fn build_stars(w: u16, h: u16, count: usize, seed: u64) -> Vec<Star> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut stars = Vec::with_capacity(count);
    if w == 0 || h == 0 {
        return stars;
    }
    for _ in 0..count {
        stars.push(Star {
            x: rng.gen_range(0..w),
            y: rng.gen_range(0..h),
            phase: rng.gen_range(0.0..std::f32::consts::TAU),
            depth: rng.gen_range(0.35..1.0),
        });
    }
    stars
}

/// Twinkling background; only fills cells nothing else has drawn into.
pub fn draw_stars(buf: &mut CellBuffer, stars: &[Star], t_real: f32, pal: Palette) {
    for s in stars {
        let free = buf
            .get(s.x, s.y)
            .is_some_and(|c| c.ch == ' ' || c.ch == BRAILLE_EMPTY);
        if !free {
            continue;
        }
        let tw = (t_real * 0.65 + s.phase).sin() * 0.5 + 0.5;
        let b = 0.2 + 0.8 * (tw * s.depth);
        let c = (40.0 + b * 180.0).clamp(0.0, 255.0) as u8;
        let ch = if b > 0.82 {
            '✦'
        } else if b > 0.62 {
            '•'
        } else {
            '·'
        };
        let fg = if pal.color {
            Color::Rgb {
                r: c,
                g: c,
                b: c.saturating_add(25),
            }
        } else {
            pal.dim()
        };
        buf.set(s.x, s.y, Cell { ch, fg, bg: BG });
    }
}

/* -----------------------------
   Layout
------------------------------ */

/// Sub-pixel rectangle on the braille canvas.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Viewport {
    /// Cell rectangle converted to canvas pixels.
    pub fn from_cells(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self {
            x: x as i32 * 2,
            y: y as i32 * 4,
            w: w as i32 * 2,
            h: h as i32 * 4,
        }
    }
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }
    pub fn half_min(&self) -> f64 {
        self.w.min(self.h).max(0) as f64 / 2.0
    }
}

/// Left info panel width in cells.
pub fn panel_width(cols: u16) -> u16 {
    (cols / 4).max(28).min(cols.saturating_sub(10))
}

/// Pixels per simulation unit so the outermost ring spans `scale` percent
/// of the usable half-view.
pub fn orbit_fit(vp: &Viewport, extent: f64, scale: f64) -> f64 {
    if extent <= 0.0 {
        return 0.0;
    }
    let usable = (vp.half_min() - 4.0).max(1.0);
    usable / extent * scale / 100.0
}

fn state_label(state: RunState) -> &'static str {
    match state {
        RunState::Stopped => "stopped",
        RunState::Running => "running",
        RunState::Paused => "paused",
    }
}

/// What the panel shows besides the frame itself.
#[derive(Clone, Copy, Debug)]
pub struct Hud {
    pub state: RunState,
    pub speed: f64,
    pub focused: bool,
}

fn draw_header(buf: &mut CellBuffer, view: ViewKind, hud: Option<Hud>, pal: Palette) {
    let mut title = format!("Lunarium  |  {}", view.title());
    if let Some(h) = hud {
        title.push_str(&format!("  |  {}  |  x{:.1}", state_label(h.state), h.speed));
        if !h.focused {
            title.push_str("  |  (unfocused)");
        }
    }
    draw_text(buf, 1, 0, &title, pal.text(), BG);
}

fn draw_footer(buf: &mut CellBuffer, text: &str, pal: Palette) {
    let y = buf.h.saturating_sub(1);
    draw_text(buf, 1, y, text, pal.dim(), BG);
}

/* -----------------------------
   Orbit view
------------------------------ */

pub fn draw_orbit(
    term: &mut Terminal,
    sim: &OrbitSim,
    frame: &[BodyFrame],
    scale: f64,
    hud: Hud,
    stars: &[Star],
    t_real: f32,
    pal: Palette,
) {
    let (cols, rows) = (term.cols, term.rows);
    term.cur.clear(BG);
    term.canvas.clear();

    let panel = panel_width(cols);
    let vp = Viewport::from_cells(panel, 1, cols.saturating_sub(panel), rows.saturating_sub(2));
    let (cx, cy) = vp.center();
    let fit = orbit_fit(&vp, sim.extent(), scale);

    let ring_px = Pixel::rgba(Rgb::new(70, 80, 100), 160);
    for (rx, ry) in sim.rings() {
        term.canvas.dotted_ellipse(cx, cy, rx * fit, ry * fit, 3.0, ring_px);
    }
    term.canvas.fill_disc(cx, cy, 3.0, Pixel::rgba(Rgb::new(255, 204, 64), 255));

    let mut labels = Vec::with_capacity(frame.len());
    for (body, f) in sim.bodies().iter().zip(frame) {
        let px = cx + f.position.x * fit;
        let py = cy + f.position.y * fit;
        let r = (body.size as f64 / 4.0).max(1.0);
        term.canvas.fill_disc(px, py, r, Pixel::rgba(body.color, 255));
        labels.push((px, py, r, body));
    }
    canvas_to_cells(&term.canvas, &mut term.cur, pal, BG);

    for (px, py, r, body) in labels {
        let lx = ((px + r) / 2.0).round() as i32 + 1;
        let ly = (py / 4.0).round() as i32;
        if lx >= panel as i32 && ly >= 1 && ly < rows as i32 - 1 {
            draw_text(&mut term.cur, lx as u16, ly as u16, &body.name, pal.dim(), BG);
        }
    }
    draw_stars(&mut term.cur, stars, t_real, pal);

    draw_header(&mut term.cur, ViewKind::Orbit, Some(hud), pal);
    let buf = &mut term.cur;
    let mut y = 2;
    for line in [
        format!("Model  {}", sim.kind().label()),
        format!("Speed  x{:.1}", hud.speed),
        format!("Scale  {:.0}%", scale),
        String::new(),
    ] {
        draw_text(buf, 1, y, &line, pal.text(), BG);
        y += 1;
    }
    for (body, f) in sim.bodies().iter().zip(frame) {
        if y + 1 >= rows {
            break;
        }
        draw_text(buf, 1, y, "●", pal.rgb(body.color), BG);
        let deg = f.angle.rem_euclid(TAU).to_degrees();
        draw_text(buf, 3, y, &format!("{:<8} {:>5.1}°", body.name, deg), pal.text(), BG);
        y += 1;
    }
    draw_footer(
        buf,
        "space pause | +/- speed | [/] scale | m model | r reset | tab view | h help | q quit",
        pal,
    );
}

/* -----------------------------
   Moon views
------------------------------ */

const MOON_LIT: Rgb = Rgb::new(230, 230, 230);
const MOON_DARK: Rgb = Rgb::new(58, 62, 74);

/// Disc lit according to `fraction` of the cycle (0 new, 0.5 full). Waxing
/// light grows from the right, waning light shrinks toward the left.
pub fn paint_moon(canvas: &mut PixelCanvas, cx: f64, cy: f64, r: f64, fraction: f64) {
    let theta = fraction.rem_euclid(1.0) * TAU;
    let cos = theta.cos();
    let waxing = theta <= std::f64::consts::PI;
    let ri = r.ceil() as i32;
    let (x0, y0) = (cx.round() as i32, cy.round() as i32);
    for dy in -ri..=ri {
        let half = (r * r - (dy * dy) as f64).max(0.0).sqrt();
        for dx in -ri..=ri {
            let d2 = (dx * dx + dy * dy) as f64;
            if d2 > r * r {
                continue;
            }
            let x = dx as f64;
            let terminator = half * cos;
            let lit = if waxing { x > terminator } else { x < -terminator };
            // outline keeps a new moon visible
            let rim = d2 > (r - 1.0) * (r - 1.0);
            if lit {
                canvas.blend_over(x0 + dx, y0 + dy, Pixel::rgba(MOON_LIT, 255));
            } else if rim {
                canvas.blend_over(x0 + dx, y0 + dy, Pixel::rgba(MOON_DARK, 255));
            }
        }
    }
}

fn draw_phase_strip(buf: &mut CellBuffer, y: u16, current: u8, pal: Palette) {
    let labels: Vec<String> = PHASES
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} {}", i + 1, short_name(p.name)))
        .collect();
    let total: usize = labels.iter().map(|l| l.chars().count() + 2).sum();
    let mut x = buf.w.saturating_sub(total as u16) / 2;
    for (i, label) in labels.iter().enumerate() {
        let on = i as u8 == current;
        let fg = if on { pal.accent() } else { pal.dim() };
        let text = if on {
            format!("[{label}]")
        } else {
            format!(" {label} ")
        };
        draw_text(buf, x, y, &text, fg, BG);
        x = x.saturating_add(text.chars().count() as u16);
    }
}

fn short_name(name: &str) -> String {
    name.split_whitespace()
        .map(|w| w.chars().take(3).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn draw_moon(
    term: &mut Terminal,
    frame: &MoonFrame,
    hud: Hud,
    stars: &[Star],
    t_real: f32,
    pal: Palette,
) {
    let (cols, rows) = (term.cols, term.rows);
    term.cur.clear(BG);
    term.canvas.clear();

    let vp = Viewport::from_cells(0, 5, cols, rows.saturating_sub(9));
    let (cx, cy) = vp.center();
    let r = (vp.half_min() * 0.85).max(2.0);
    paint_moon(&mut term.canvas, cx, cy, r, frame.cycle_day / frame.cycle_length);
    canvas_to_cells(&term.canvas, &mut term.cur, pal, BG);
    draw_stars(&mut term.cur, stars, t_real, pal);

    let buf = &mut term.cur;
    draw_header(buf, ViewKind::Moon, Some(hud), pal);
    draw_centered(buf, 0, cols, 2, &frame.day_label(), pal.accent());
    draw_centered(buf, 0, cols, 3, frame.phase_name, pal.text());
    draw_centered(
        buf,
        0,
        cols,
        4,
        &format!(
            "{}% illuminated  |  terminator {:.2} {}",
            frame.illumination_percent.round() as i64,
            frame.shadow.offset,
            if frame.shadow.waxing { "waxing" } else { "waning" }
        ),
        pal.dim(),
    );
    draw_phase_strip(buf, rows.saturating_sub(3), frame.phase_index, pal);
    draw_footer(
        buf,
        "space pause | +/- speed | 1-8 jump | ←/→ step | r reset | tab view | h help | q quit",
        pal,
    );
}

pub fn draw_today(term: &mut Terminal, browser: &PhaseBrowser, stars: &[Star], t_real: f32, pal: Palette) {
    let (cols, rows) = (term.cols, term.rows);
    term.cur.clear(BG);
    term.canvas.clear();

    let panel = panel_width(cols).max(cols / 2).min(cols.saturating_sub(10));
    let vp = Viewport::from_cells(panel, 1, cols.saturating_sub(panel), rows.saturating_sub(2));
    let (cx, cy) = vp.center();
    let r = (vp.half_min() * 0.75).max(2.0);
    let fraction = f64::from(browser.phase) / f64::from(PHASE_COUNT);
    paint_moon(&mut term.canvas, cx, cy, r, fraction);
    canvas_to_cells(&term.canvas, &mut term.cur, pal, BG);
    draw_stars(&mut term.cur, stars, t_real, pal);

    let buf = &mut term.cur;
    draw_header(buf, ViewKind::Today, None, pal);
    let info = phase_info(browser.phase);
    draw_text(buf, 2, 2, &browser.date.format("%A, %B %-d, %Y").to_string(), pal.dim(), BG);
    draw_text(buf, 2, 4, info.name, pal.accent(), BG);
    let mut y = 6;
    for line in wrap(info.description, panel.saturating_sub(4).max(10) as usize) {
        draw_text(buf, 2, y, &line, pal.text(), BG);
        y += 1;
    }
    y += 1;
    draw_text(
        buf,
        2,
        y,
        &format!("Phase {} of {}", browser.phase + 1, PHASE_COUNT),
        pal.dim(),
        BG,
    );
    draw_text(
        buf,
        2,
        y + 1,
        &format!("Cycle day {:.1} of {:.2}", browser.cycle_day, crate::moon::SYNODIC_MONTH_DAYS),
        pal.dim(),
        BG,
    );
    if browser.tour.is_running() {
        draw_text(buf, 2, y + 3, "Animating cycle...", pal.accent(), BG);
    }
    draw_footer(buf, "←/→ browse | a animate | r today | tab view | h help | q quit", pal);
}

pub const HELP_TEXT: &str = "Tab cycles Orbits -> Moon -> Today.\n\n\
Orbits: space/p pause, +/- speed (0.5-5x)\n\
  [ ] scale 50-150%, m circular/elliptical, r reset\n\
Moon:   space/p pause, +/- speed (0.5-3x)\n\
  1-8 jump to phase, left/right step, r reset\n\
Today:  left/right browse, a animate the cycle,\n\
  r back to today\n\n\
Animation pauses while the terminal is unfocused.\n\n\
Esc or H to close help. Q quits.";
