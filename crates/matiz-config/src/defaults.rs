//! Package-bundled default catalog.
//!
//! This is the required lowest-priority layer, embedded at compile time so
//! a bare installation always has a working set of effects. It uses the
//! flat encoding; the loader wraps it under the `effects` namespace.

/// TOML content of the package defaults, flat encoding.
pub const PACKAGE_DEFAULTS: &str = r##"
version = 2

# --- parameter types -------------------------------------------------------

[parameter_types.blur_geometry]
type = "string"
pattern = '^\d+x\d+$'
default = "0x8"
description = "ImageMagick radius x sigma geometry"

[parameter_types.percentage]
type = "integer"
min = 0
max = 200
default = 100
description = "Percentage, 100 leaves the channel untouched"

[parameter_types.angle]
type = "float"
min = -360.0
max = 360.0
default = 90.0
description = "Rotation angle in degrees"

[parameter_types.color]
type = "string"
pattern = '^#?[0-9A-Fa-f]{6}$'
default = "#000000"
description = "RGB hex color"

# --- effects ----------------------------------------------------------------

[effects.blur]
description = "Gaussian blur"
command = 'magick "$INPUT" -blur "$BLUR" "$OUTPUT"'
[effects.blur.parameters.blur]
type = "blur_geometry"
cli_flag = "--blur"

[effects.brightness]
description = "Adjust overall brightness"
command = 'magick "$INPUT" -modulate "$BRIGHTNESS" "$OUTPUT"'
[effects.brightness.parameters.brightness]
type = "percentage"
default = 80
cli_flag = "--brightness"

[effects.saturation]
description = "Adjust color saturation"
command = 'magick "$INPUT" -modulate "100,$SATURATION" "$OUTPUT"'
[effects.saturation.parameters.saturation]
type = "percentage"
default = 50
cli_flag = "--saturation"

[effects.contrast]
description = "Adjust contrast"
command = 'magick "$INPUT" -brightness-contrast "0x$CONTRAST" "$OUTPUT"'
[effects.contrast.parameters.contrast]
type = "integer"
default = 10
cli_flag = "--contrast"

[effects.dim]
description = "Darken toward black"
command = 'magick "$INPUT" -fill black -colorize "$DIM%" "$OUTPUT"'
[effects.dim.parameters.dim]
type = "percentage"
default = 40
cli_flag = "--dim"

[effects.grayscale]
description = "Convert to grayscale"
command = 'magick "$INPUT" -colorspace Gray "$OUTPUT"'

[effects.sepia]
description = "Sepia tone"
command = 'magick "$INPUT" -sepia-tone "$LEVEL%" "$OUTPUT"'
[effects.sepia.parameters.level]
type = "percentage"
default = 80
cli_flag = "--level"

[effects.negate]
description = "Invert all channels"
command = 'magick "$INPUT" -negate "$OUTPUT"'

[effects.vignette]
description = "Darkened soft-edge vignette"
command = 'magick "$INPUT" -background black -vignette "$VIGNETTE" "$OUTPUT"'
[effects.vignette.parameters.vignette]
type = "blur_geometry"
default = "0x20"
cli_flag = "--vignette"

[effects.pixelate]
description = "Blocky downscale-upscale pixelation"
command = 'magick "$INPUT" -scale "$FACTOR%" -scale 1000% "$OUTPUT"'
[effects.pixelate.parameters.factor]
type = "percentage"
default = 10
cli_flag = "--factor"

[effects.tint]
description = "Overlay a translucent color"
command = 'magick "$INPUT" -fill "$COLOR" -colorize "$OPACITY%" "$OUTPUT"'
[effects.tint.parameters.color]
type = "color"
cli_flag = "--color"
[effects.tint.parameters.opacity]
type = "percentage"
default = 30
cli_flag = "--opacity"

[effects.rotate]
description = "Rotate around the center"
command = 'magick "$INPUT" -rotate "$ANGLE" "$OUTPUT"'
[effects.rotate.parameters.angle]
type = "angle"
cli_flag = "--angle"

# --- composites -------------------------------------------------------------

[composites.lockscreen_soft]
description = "Dim then blur, for lockscreen backgrounds"
chain = [
    { effect = "dim", params = { dim = 50 } },
    { effect = "blur", params = { blur = "0x24" } },
]

[composites.vintage]
description = "Sepia tone with a vignette"
chain = [
    { effect = "sepia" },
    { effect = "vignette" },
]

[composites.muted]
description = "Desaturate and darken slightly"
chain = [
    { effect = "saturation", params = { saturation = 40 } },
    { effect = "brightness", params = { brightness = 90 } },
]

# --- presets ----------------------------------------------------------------

[presets.lockscreen]
description = "Ready-to-use lockscreen treatment"
composite = "lockscreen_soft"

[presets.vintage]
description = "Old-photo look"
composite = "vintage"

[presets.night]
description = "Strong dim for dark rooms"
effect = "dim"
[presets.night.params]
dim = 60

[presets.soft]
description = "Light blur only"
effect = "blur"
[presets.soft.params]
blur = "0x12"
"##;
