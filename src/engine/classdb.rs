//! SE-004: Class database and type registry.
//!
//! The class database describes every class the engine knows: its parent,
//! whether it is a node or a resource, whether it can be instantiated, and
//! its typed properties. The type registry resolves user-supplied type names
//! against a curated table first and falls back to the class database,
//! rejecting abstract classes and classes of the wrong category.

use super::document::SceneNode;
use super::tscn;
use super::variant::{Variant, VariantType as T};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Node,
    Resource,
}

#[derive(Debug, Clone, Copy)]
pub struct PropertyInfo {
    pub name: &'static str,
    pub ty: T,
}

#[derive(Debug)]
pub struct ClassInfo {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub kind: ClassKind,
    pub instantiable: bool,
    pub properties: &'static [PropertyInfo],
}

const fn p(name: &'static str, ty: T) -> PropertyInfo {
    PropertyInfo { name, ty }
}

const fn node(
    name: &'static str,
    parent: &'static str,
    properties: &'static [PropertyInfo],
) -> ClassInfo {
    ClassInfo {
        name,
        parent: Some(parent),
        kind: ClassKind::Node,
        instantiable: true,
        properties,
    }
}

const fn abstract_node(
    name: &'static str,
    parent: &'static str,
    properties: &'static [PropertyInfo],
) -> ClassInfo {
    ClassInfo {
        name,
        parent: Some(parent),
        kind: ClassKind::Node,
        instantiable: false,
        properties,
    }
}

const fn resource(
    name: &'static str,
    parent: &'static str,
    properties: &'static [PropertyInfo],
) -> ClassInfo {
    ClassInfo {
        name,
        parent: Some(parent),
        kind: ClassKind::Resource,
        instantiable: true,
        properties,
    }
}

const fn abstract_resource(
    name: &'static str,
    parent: &'static str,
    properties: &'static [PropertyInfo],
) -> ClassInfo {
    ClassInfo {
        name,
        parent: Some(parent),
        kind: ClassKind::Resource,
        instantiable: false,
        properties,
    }
}

static CLASSES: &[ClassInfo] = &[
    // ---- roots ----
    ClassInfo {
        name: "Node",
        parent: None,
        kind: ClassKind::Node,
        instantiable: true,
        properties: &[
            p("process_mode", T::Int),
            p("process_priority", T::Int),
            p("editor_description", T::String),
            p("unique_name_in_owner", T::Bool),
            p("script", T::Resource),
        ],
    },
    ClassInfo {
        name: "Resource",
        parent: None,
        kind: ClassKind::Resource,
        instantiable: true,
        properties: &[
            p("resource_local_to_scene", T::Bool),
            p("resource_name", T::String),
            p("script", T::Resource),
        ],
    },
    // ---- 2D ----
    abstract_node(
        "CanvasItem",
        "Node",
        &[
            p("visible", T::Bool),
            p("modulate", T::Color),
            p("self_modulate", T::Color),
            p("show_behind_parent", T::Bool),
            p("top_level", T::Bool),
            p("light_mask", T::Int),
            p("z_index", T::Int),
            p("z_as_relative", T::Bool),
            p("y_sort_enabled", T::Bool),
            p("texture_filter", T::Int),
            p("material", T::Resource),
        ],
    ),
    node(
        "Node2D",
        "CanvasItem",
        &[
            p("position", T::Vector2),
            p("rotation", T::Float),
            p("rotation_degrees", T::Float),
            p("scale", T::Vector2),
            p("skew", T::Float),
        ],
    ),
    node(
        "Sprite2D",
        "Node2D",
        &[
            p("texture", T::Resource),
            p("centered", T::Bool),
            p("offset", T::Vector2),
            p("flip_h", T::Bool),
            p("flip_v", T::Bool),
            p("hframes", T::Int),
            p("vframes", T::Int),
            p("frame", T::Int),
            p("region_enabled", T::Bool),
            p("region_rect", T::Rect2),
        ],
    ),
    node(
        "AnimatedSprite2D",
        "Node2D",
        &[
            p("sprite_frames", T::Resource),
            p("animation", T::String),
            p("autoplay", T::String),
            p("frame", T::Int),
            p("speed_scale", T::Float),
            p("centered", T::Bool),
            p("offset", T::Vector2),
            p("flip_h", T::Bool),
            p("flip_v", T::Bool),
        ],
    ),
    abstract_node(
        "CollisionObject2D",
        "Node2D",
        &[
            p("collision_layer", T::Int),
            p("collision_mask", T::Int),
            p("collision_priority", T::Float),
            p("input_pickable", T::Bool),
        ],
    ),
    abstract_node("PhysicsBody2D", "CollisionObject2D", &[]),
    node(
        "CharacterBody2D",
        "PhysicsBody2D",
        &[
            p("motion_mode", T::Int),
            p("up_direction", T::Vector2),
            p("velocity", T::Vector2),
            p("floor_max_angle", T::Float),
            p("floor_snap_length", T::Float),
            p("slide_on_ceiling", T::Bool),
            p("max_slides", T::Int),
        ],
    ),
    node(
        "RigidBody2D",
        "PhysicsBody2D",
        &[
            p("mass", T::Float),
            p("gravity_scale", T::Float),
            p("linear_velocity", T::Vector2),
            p("angular_velocity", T::Float),
            p("linear_damp", T::Float),
            p("angular_damp", T::Float),
            p("lock_rotation", T::Bool),
            p("freeze", T::Bool),
            p("physics_material_override", T::Resource),
        ],
    ),
    node(
        "StaticBody2D",
        "PhysicsBody2D",
        &[
            p("constant_linear_velocity", T::Vector2),
            p("constant_angular_velocity", T::Float),
            p("physics_material_override", T::Resource),
        ],
    ),
    node(
        "Area2D",
        "CollisionObject2D",
        &[
            p("monitoring", T::Bool),
            p("monitorable", T::Bool),
            p("priority", T::Int),
            p("gravity", T::Float),
            p("gravity_direction", T::Vector2),
        ],
    ),
    node(
        "CollisionShape2D",
        "Node2D",
        &[
            p("shape", T::Resource),
            p("disabled", T::Bool),
            p("one_way_collision", T::Bool),
            p("debug_color", T::Color),
        ],
    ),
    node(
        "CollisionPolygon2D",
        "Node2D",
        &[p("polygon", T::Any), p("disabled", T::Bool)],
    ),
    node(
        "Camera2D",
        "Node2D",
        &[
            p("offset", T::Vector2),
            p("anchor_mode", T::Int),
            p("ignore_rotation", T::Bool),
            p("enabled", T::Bool),
            p("zoom", T::Vector2),
            p("limit_left", T::Int),
            p("limit_top", T::Int),
            p("limit_right", T::Int),
            p("limit_bottom", T::Int),
            p("position_smoothing_enabled", T::Bool),
            p("position_smoothing_speed", T::Float),
        ],
    ),
    node("Marker2D", "Node2D", &[p("gizmo_extents", T::Float)]),
    node("Path2D", "Node2D", &[p("curve", T::Resource)]),
    node(
        "PathFollow2D",
        "Node2D",
        &[
            p("progress", T::Float),
            p("progress_ratio", T::Float),
            p("loop", T::Bool),
            p("rotates", T::Bool),
        ],
    ),
    node(
        "Line2D",
        "Node2D",
        &[
            p("points", T::Any),
            p("width", T::Float),
            p("default_color", T::Color),
            p("closed", T::Bool),
        ],
    ),
    node(
        "Polygon2D",
        "Node2D",
        &[
            p("polygon", T::Any),
            p("color", T::Color),
            p("texture", T::Resource),
        ],
    ),
    node(
        "RayCast2D",
        "Node2D",
        &[
            p("enabled", T::Bool),
            p("target_position", T::Vector2),
            p("collision_mask", T::Int),
        ],
    ),
    node(
        "TileMap",
        "Node2D",
        &[p("tile_set", T::Resource), p("rendering_quadrant_size", T::Int)],
    ),
    node(
        "GPUParticles2D",
        "Node2D",
        &[
            p("emitting", T::Bool),
            p("amount", T::Int),
            p("lifetime", T::Float),
            p("one_shot", T::Bool),
            p("process_material", T::Resource),
            p("texture", T::Resource),
        ],
    ),
    abstract_node(
        "Light2D",
        "Node2D",
        &[
            p("enabled", T::Bool),
            p("color", T::Color),
            p("energy", T::Float),
        ],
    ),
    node("PointLight2D", "Light2D", &[p("texture", T::Resource)]),
    node("VisibleOnScreenNotifier2D", "Node2D", &[p("rect", T::Rect2)]),
    // ---- 3D ----
    node(
        "Node3D",
        "Node",
        &[
            p("position", T::Vector3),
            p("rotation", T::Vector3),
            p("rotation_degrees", T::Vector3),
            p("scale", T::Vector3),
            p("visible", T::Bool),
            p("top_level", T::Bool),
        ],
    ),
    abstract_node("VisualInstance3D", "Node3D", &[p("layers", T::Int)]),
    abstract_node(
        "GeometryInstance3D",
        "VisualInstance3D",
        &[
            p("material_override", T::Resource),
            p("cast_shadow", T::Int),
            p("transparency", T::Float),
        ],
    ),
    node(
        "MeshInstance3D",
        "GeometryInstance3D",
        &[p("mesh", T::Resource), p("skeleton", T::NodePath)],
    ),
    node(
        "Sprite3D",
        "GeometryInstance3D",
        &[
            p("texture", T::Resource),
            p("pixel_size", T::Float),
            p("billboard", T::Int),
            p("centered", T::Bool),
            p("offset", T::Vector2),
            p("modulate", T::Color),
            p("flip_h", T::Bool),
            p("flip_v", T::Bool),
        ],
    ),
    node(
        "CSGBox3D",
        "GeometryInstance3D",
        &[p("size", T::Vector3), p("material", T::Resource)],
    ),
    node(
        "Camera3D",
        "Node3D",
        &[
            p("current", T::Bool),
            p("fov", T::Float),
            p("near", T::Float),
            p("far", T::Float),
            p("projection", T::Int),
            p("size", T::Float),
            p("cull_mask", T::Int),
        ],
    ),
    abstract_node(
        "Light3D",
        "VisualInstance3D",
        &[
            p("light_color", T::Color),
            p("light_energy", T::Float),
            p("light_indirect_energy", T::Float),
            p("shadow_enabled", T::Bool),
        ],
    ),
    node(
        "DirectionalLight3D",
        "Light3D",
        &[
            p("directional_shadow_mode", T::Int),
            p("directional_shadow_max_distance", T::Float),
        ],
    ),
    node(
        "OmniLight3D",
        "Light3D",
        &[p("omni_range", T::Float), p("omni_attenuation", T::Float)],
    ),
    node(
        "SpotLight3D",
        "Light3D",
        &[p("spot_range", T::Float), p("spot_angle", T::Float)],
    ),
    abstract_node(
        "CollisionObject3D",
        "Node3D",
        &[
            p("collision_layer", T::Int),
            p("collision_mask", T::Int),
            p("input_ray_pickable", T::Bool),
        ],
    ),
    abstract_node("PhysicsBody3D", "CollisionObject3D", &[]),
    node(
        "CharacterBody3D",
        "PhysicsBody3D",
        &[
            p("motion_mode", T::Int),
            p("up_direction", T::Vector3),
            p("velocity", T::Vector3),
            p("floor_max_angle", T::Float),
            p("floor_snap_length", T::Float),
        ],
    ),
    node(
        "RigidBody3D",
        "PhysicsBody3D",
        &[
            p("mass", T::Float),
            p("gravity_scale", T::Float),
            p("linear_velocity", T::Vector3),
            p("angular_velocity", T::Vector3),
            p("freeze", T::Bool),
            p("physics_material_override", T::Resource),
        ],
    ),
    node(
        "StaticBody3D",
        "PhysicsBody3D",
        &[
            p("constant_linear_velocity", T::Vector3),
            p("constant_angular_velocity", T::Vector3),
            p("physics_material_override", T::Resource),
        ],
    ),
    node(
        "Area3D",
        "CollisionObject3D",
        &[
            p("monitoring", T::Bool),
            p("monitorable", T::Bool),
            p("priority", T::Int),
            p("gravity", T::Float),
        ],
    ),
    node(
        "CollisionShape3D",
        "Node3D",
        &[p("shape", T::Resource), p("disabled", T::Bool)],
    ),
    node(
        "RayCast3D",
        "Node3D",
        &[
            p("enabled", T::Bool),
            p("target_position", T::Vector3),
            p("collision_mask", T::Int),
        ],
    ),
    node("Marker3D", "Node3D", &[p("gizmo_extents", T::Float)]),
    node(
        "GPUParticles3D",
        "GeometryInstance3D",
        &[
            p("emitting", T::Bool),
            p("amount", T::Int),
            p("lifetime", T::Float),
            p("process_material", T::Resource),
            p("draw_pass_1", T::Resource),
        ],
    ),
    node(
        "NavigationRegion3D",
        "Node3D",
        &[p("navigation_mesh", T::Resource), p("enabled", T::Bool)],
    ),
    node(
        "WorldEnvironment",
        "Node",
        &[
            p("environment", T::Resource),
            p("camera_attributes", T::Resource),
        ],
    ),
    // ---- UI ----
    node(
        "Control",
        "CanvasItem",
        &[
            p("position", T::Vector2),
            p("size", T::Vector2),
            p("rotation", T::Float),
            p("scale", T::Vector2),
            p("pivot_offset", T::Vector2),
            p("custom_minimum_size", T::Vector2),
            p("anchor_left", T::Float),
            p("anchor_top", T::Float),
            p("anchor_right", T::Float),
            p("anchor_bottom", T::Float),
            p("offset_left", T::Float),
            p("offset_top", T::Float),
            p("offset_right", T::Float),
            p("offset_bottom", T::Float),
            p("anchors_preset", T::Int),
            p("layout_mode", T::Int),
            p("grow_horizontal", T::Int),
            p("grow_vertical", T::Int),
            p("size_flags_horizontal", T::Int),
            p("size_flags_vertical", T::Int),
            p("tooltip_text", T::String),
            p("mouse_filter", T::Int),
            p("focus_mode", T::Int),
            p("clip_contents", T::Bool),
            p("theme", T::Resource),
        ],
    ),
    node(
        "Label",
        "Control",
        &[
            p("text", T::String),
            p("horizontal_alignment", T::Int),
            p("vertical_alignment", T::Int),
            p("autowrap_mode", T::Int),
            p("uppercase", T::Bool),
            p("visible_characters", T::Int),
            p("label_settings", T::Resource),
        ],
    ),
    abstract_node(
        "BaseButton",
        "Control",
        &[
            p("disabled", T::Bool),
            p("toggle_mode", T::Bool),
            p("button_pressed", T::Bool),
            p("action_mode", T::Int),
            p("shortcut", T::Resource),
        ],
    ),
    node(
        "Button",
        "BaseButton",
        &[
            p("text", T::String),
            p("icon", T::Resource),
            p("flat", T::Bool),
            p("alignment", T::Int),
            p("expand_icon", T::Bool),
        ],
    ),
    node("CheckBox", "Button", &[]),
    node(
        "TextureButton",
        "BaseButton",
        &[
            p("texture_normal", T::Resource),
            p("texture_pressed", T::Resource),
            p("texture_hover", T::Resource),
            p("ignore_texture_size", T::Bool),
            p("stretch_mode", T::Int),
        ],
    ),
    node("Panel", "Control", &[]),
    abstract_node("Container", "Control", &[]),
    node("PanelContainer", "Container", &[]),
    abstract_node("BoxContainer", "Container", &[p("alignment", T::Int)]),
    node("HBoxContainer", "BoxContainer", &[]),
    node("VBoxContainer", "BoxContainer", &[]),
    node("MarginContainer", "Container", &[]),
    node("CenterContainer", "Container", &[p("use_top_left", T::Bool)]),
    node("GridContainer", "Container", &[p("columns", T::Int)]),
    node("ColorRect", "Control", &[p("color", T::Color)]),
    node(
        "TextureRect",
        "Control",
        &[
            p("texture", T::Resource),
            p("expand_mode", T::Int),
            p("stretch_mode", T::Int),
            p("flip_h", T::Bool),
            p("flip_v", T::Bool),
        ],
    ),
    node(
        "NinePatchRect",
        "Control",
        &[
            p("texture", T::Resource),
            p("patch_margin_left", T::Int),
            p("patch_margin_top", T::Int),
            p("patch_margin_right", T::Int),
            p("patch_margin_bottom", T::Int),
        ],
    ),
    node(
        "LineEdit",
        "Control",
        &[
            p("text", T::String),
            p("placeholder_text", T::String),
            p("editable", T::Bool),
            p("max_length", T::Int),
            p("secret", T::Bool),
        ],
    ),
    node(
        "TextEdit",
        "Control",
        &[
            p("text", T::String),
            p("placeholder_text", T::String),
            p("editable", T::Bool),
        ],
    ),
    node(
        "RichTextLabel",
        "Control",
        &[
            p("text", T::String),
            p("bbcode_enabled", T::Bool),
            p("fit_content", T::Bool),
            p("scroll_active", T::Bool),
        ],
    ),
    abstract_node(
        "Range",
        "Control",
        &[
            p("min_value", T::Float),
            p("max_value", T::Float),
            p("step", T::Float),
            p("value", T::Float),
            p("rounded", T::Bool),
        ],
    ),
    node(
        "ProgressBar",
        "Range",
        &[p("show_percentage", T::Bool), p("fill_mode", T::Int)],
    ),
    abstract_node(
        "Slider",
        "Range",
        &[p("editable", T::Bool), p("scrollable", T::Bool)],
    ),
    node("HSlider", "Slider", &[]),
    node("VSlider", "Slider", &[]),
    node(
        "CanvasLayer",
        "Node",
        &[
            p("layer", T::Int),
            p("visible", T::Bool),
            p("offset", T::Vector2),
            p("rotation", T::Float),
            p("scale", T::Vector2),
            p("follow_viewport_enabled", T::Bool),
        ],
    ),
    // ---- audio ----
    node(
        "AudioStreamPlayer",
        "Node",
        &[
            p("stream", T::Resource),
            p("volume_db", T::Float),
            p("pitch_scale", T::Float),
            p("playing", T::Bool),
            p("autoplay", T::Bool),
            p("stream_paused", T::Bool),
            p("mix_target", T::Int),
            p("bus", T::String),
        ],
    ),
    node(
        "AudioStreamPlayer2D",
        "Node2D",
        &[
            p("stream", T::Resource),
            p("volume_db", T::Float),
            p("pitch_scale", T::Float),
            p("autoplay", T::Bool),
            p("max_distance", T::Float),
            p("attenuation", T::Float),
            p("bus", T::String),
        ],
    ),
    node(
        "AudioStreamPlayer3D",
        "Node3D",
        &[
            p("stream", T::Resource),
            p("volume_db", T::Float),
            p("unit_size", T::Float),
            p("max_db", T::Float),
            p("pitch_scale", T::Float),
            p("autoplay", T::Bool),
            p("max_distance", T::Float),
            p("bus", T::String),
        ],
    ),
    // ---- animation & misc ----
    abstract_node(
        "AnimationMixer",
        "Node",
        &[
            p("active", T::Bool),
            p("deterministic", T::Bool),
            p("root_node", T::NodePath),
            p("libraries", T::Dictionary),
            p("callback_mode_process", T::Int),
        ],
    ),
    node(
        "AnimationPlayer",
        "AnimationMixer",
        &[
            p("autoplay", T::String),
            p("speed_scale", T::Float),
            p("playback_default_blend_time", T::Float),
            p("current_animation", T::String),
        ],
    ),
    node(
        "AnimationTree",
        "AnimationMixer",
        &[
            p("tree_root", T::Resource),
            p("anim_player", T::NodePath),
            p("advance_expression_base_node", T::NodePath),
        ],
    ),
    node(
        "Timer",
        "Node",
        &[
            p("wait_time", T::Float),
            p("one_shot", T::Bool),
            p("autostart", T::Bool),
            p("process_callback", T::Int),
            p("paused", T::Bool),
        ],
    ),
    node(
        "HTTPRequest",
        "Node",
        &[p("timeout", T::Float), p("max_redirects", T::Int)],
    ),
    node(
        "NavigationAgent2D",
        "Node",
        &[
            p("target_desired_distance", T::Float),
            p("path_desired_distance", T::Float),
            p("radius", T::Float),
            p("avoidance_enabled", T::Bool),
        ],
    ),
    // ---- shapes ----
    abstract_resource("Shape2D", "Resource", &[p("custom_solver_bias", T::Float)]),
    resource("RectangleShape2D", "Shape2D", &[p("size", T::Vector2)]),
    resource("CircleShape2D", "Shape2D", &[p("radius", T::Float)]),
    resource(
        "CapsuleShape2D",
        "Shape2D",
        &[p("radius", T::Float), p("height", T::Float)],
    ),
    resource(
        "SegmentShape2D",
        "Shape2D",
        &[p("a", T::Vector2), p("b", T::Vector2)],
    ),
    resource(
        "WorldBoundaryShape2D",
        "Shape2D",
        &[p("normal", T::Vector2), p("distance", T::Float)],
    ),
    resource("ConvexPolygonShape2D", "Shape2D", &[p("points", T::Any)]),
    abstract_resource("Shape3D", "Resource", &[p("margin", T::Float)]),
    resource("BoxShape3D", "Shape3D", &[p("size", T::Vector3)]),
    resource("SphereShape3D", "Shape3D", &[p("radius", T::Float)]),
    resource(
        "CapsuleShape3D",
        "Shape3D",
        &[p("radius", T::Float), p("height", T::Float)],
    ),
    resource(
        "CylinderShape3D",
        "Shape3D",
        &[p("radius", T::Float), p("height", T::Float)],
    ),
    resource("WorldBoundaryShape3D", "Shape3D", &[p("plane", T::Any)]),
    // ---- meshes ----
    abstract_resource("Mesh", "Resource", &[]),
    abstract_resource(
        "PrimitiveMesh",
        "Mesh",
        &[
            p("material", T::Resource),
            p("flip_faces", T::Bool),
            p("add_uv2", T::Bool),
        ],
    ),
    resource(
        "BoxMesh",
        "PrimitiveMesh",
        &[
            p("size", T::Vector3),
            p("subdivide_width", T::Int),
            p("subdivide_height", T::Int),
            p("subdivide_depth", T::Int),
        ],
    ),
    resource(
        "SphereMesh",
        "PrimitiveMesh",
        &[
            p("radius", T::Float),
            p("height", T::Float),
            p("radial_segments", T::Int),
            p("rings", T::Int),
            p("is_hemisphere", T::Bool),
        ],
    ),
    resource(
        "CylinderMesh",
        "PrimitiveMesh",
        &[
            p("top_radius", T::Float),
            p("bottom_radius", T::Float),
            p("height", T::Float),
            p("radial_segments", T::Int),
            p("rings", T::Int),
        ],
    ),
    resource(
        "CapsuleMesh",
        "PrimitiveMesh",
        &[
            p("radius", T::Float),
            p("height", T::Float),
            p("radial_segments", T::Int),
            p("rings", T::Int),
        ],
    ),
    resource(
        "PlaneMesh",
        "PrimitiveMesh",
        &[
            p("size", T::Vector2),
            p("subdivide_width", T::Int),
            p("subdivide_depth", T::Int),
            p("orientation", T::Int),
        ],
    ),
    resource("QuadMesh", "PlaneMesh", &[]),
    resource(
        "PrismMesh",
        "PrimitiveMesh",
        &[p("left_to_right", T::Float), p("size", T::Vector3)],
    ),
    resource(
        "TorusMesh",
        "PrimitiveMesh",
        &[p("inner_radius", T::Float), p("outer_radius", T::Float)],
    ),
    // ---- materials ----
    abstract_resource(
        "Material",
        "Resource",
        &[p("render_priority", T::Int), p("next_pass", T::Resource)],
    ),
    abstract_resource(
        "BaseMaterial3D",
        "Material",
        &[
            p("albedo_color", T::Color),
            p("albedo_texture", T::Resource),
            p("metallic", T::Float),
            p("roughness", T::Float),
            p("emission_enabled", T::Bool),
            p("emission", T::Color),
            p("emission_energy_multiplier", T::Float),
            p("transparency", T::Int),
            p("shading_mode", T::Int),
            p("cull_mode", T::Int),
            p("normal_enabled", T::Bool),
            p("normal_texture", T::Resource),
        ],
    ),
    resource("StandardMaterial3D", "BaseMaterial3D", &[]),
    resource("ORMMaterial3D", "BaseMaterial3D", &[]),
    resource("ShaderMaterial", "Material", &[p("shader", T::Resource)]),
    resource(
        "CanvasItemMaterial",
        "Material",
        &[p("blend_mode", T::Int), p("light_mode", T::Int)],
    ),
    resource(
        "ProceduralSkyMaterial",
        "Material",
        &[
            p("sky_top_color", T::Color),
            p("sky_horizon_color", T::Color),
            p("ground_bottom_color", T::Color),
        ],
    ),
    resource("Shader", "Resource", &[p("code", T::String)]),
    // ---- textures ----
    abstract_resource("Texture", "Resource", &[]),
    abstract_resource("Texture2D", "Texture", &[]),
    resource(
        "GradientTexture1D",
        "Texture2D",
        &[
            p("gradient", T::Resource),
            p("width", T::Int),
            p("use_hdr", T::Bool),
        ],
    ),
    resource(
        "GradientTexture2D",
        "Texture2D",
        &[
            p("gradient", T::Resource),
            p("width", T::Int),
            p("height", T::Int),
            p("fill", T::Int),
            p("fill_from", T::Vector2),
            p("fill_to", T::Vector2),
            p("repeat", T::Int),
        ],
    ),
    resource(
        "NoiseTexture2D",
        "Texture2D",
        &[
            p("noise", T::Resource),
            p("width", T::Int),
            p("height", T::Int),
            p("seamless", T::Bool),
            p("invert", T::Bool),
            p("as_normal_map", T::Bool),
        ],
    ),
    resource(
        "AtlasTexture",
        "Texture2D",
        &[
            p("atlas", T::Resource),
            p("region", T::Rect2),
            p("margin", T::Rect2),
            p("filter_clip", T::Bool),
        ],
    ),
    abstract_resource("Noise", "Resource", &[]),
    resource(
        "FastNoiseLite",
        "Noise",
        &[
            p("noise_type", T::Int),
            p("seed", T::Int),
            p("frequency", T::Float),
        ],
    ),
    // ---- curves, gradients, animation ----
    resource(
        "Curve",
        "Resource",
        &[
            p("min_value", T::Float),
            p("max_value", T::Float),
            p("bake_resolution", T::Int),
            p("point_count", T::Int),
        ],
    ),
    resource(
        "Curve2D",
        "Resource",
        &[p("bake_interval", T::Float), p("point_count", T::Int)],
    ),
    resource(
        "Curve3D",
        "Resource",
        &[
            p("bake_interval", T::Float),
            p("up_vector_enabled", T::Bool),
            p("point_count", T::Int),
        ],
    ),
    resource(
        "Gradient",
        "Resource",
        &[
            p("offsets", T::Any),
            p("colors", T::Any),
            p("interpolation_mode", T::Int),
        ],
    ),
    resource(
        "Animation",
        "Resource",
        &[
            p("length", T::Float),
            p("loop_mode", T::Int),
            p("step", T::Float),
        ],
    ),
    resource("AnimationLibrary", "Resource", &[p("_data", T::Dictionary)]),
    resource("SpriteFrames", "Resource", &[p("animations", T::Array)]),
    // ---- UI & environment ----
    resource(
        "Theme",
        "Resource",
        &[
            p("default_base_scale", T::Float),
            p("default_font", T::Resource),
            p("default_font_size", T::Int),
        ],
    ),
    abstract_resource(
        "StyleBox",
        "Resource",
        &[
            p("content_margin_left", T::Float),
            p("content_margin_top", T::Float),
            p("content_margin_right", T::Float),
            p("content_margin_bottom", T::Float),
        ],
    ),
    resource(
        "StyleBoxFlat",
        "StyleBox",
        &[
            p("bg_color", T::Color),
            p("border_color", T::Color),
            p("border_width_left", T::Int),
            p("border_width_top", T::Int),
            p("border_width_right", T::Int),
            p("border_width_bottom", T::Int),
            p("corner_radius_top_left", T::Int),
            p("corner_radius_top_right", T::Int),
            p("corner_radius_bottom_right", T::Int),
            p("corner_radius_bottom_left", T::Int),
            p("draw_center", T::Bool),
            p("shadow_color", T::Color),
            p("shadow_size", T::Int),
        ],
    ),
    resource("StyleBoxEmpty", "StyleBox", &[]),
    resource("StyleBoxTexture", "StyleBox", &[p("texture", T::Resource)]),
    resource(
        "LabelSettings",
        "Resource",
        &[
            p("font", T::Resource),
            p("font_size", T::Int),
            p("font_color", T::Color),
            p("outline_size", T::Int),
            p("outline_color", T::Color),
            p("shadow_size", T::Int),
            p("shadow_color", T::Color),
            p("line_spacing", T::Float),
        ],
    ),
    resource(
        "Environment",
        "Resource",
        &[
            p("background_mode", T::Int),
            p("background_color", T::Color),
            p("sky", T::Resource),
            p("ambient_light_source", T::Int),
            p("ambient_light_color", T::Color),
            p("ambient_light_energy", T::Float),
            p("tonemap_mode", T::Int),
            p("glow_enabled", T::Bool),
            p("fog_enabled", T::Bool),
        ],
    ),
    resource("Sky", "Resource", &[p("sky_material", T::Resource)]),
    resource(
        "PhysicsMaterial",
        "Resource",
        &[
            p("friction", T::Float),
            p("bounce", T::Float),
            p("rough", T::Bool),
            p("absorbent", T::Bool),
        ],
    ),
    resource("PackedScene", "Resource", &[p("_bundled", T::Dictionary)]),
    resource("TileSet", "Resource", &[p("tile_size", T::Vector2)]),
    resource(
        "NavigationMesh",
        "Resource",
        &[p("agent_radius", T::Float), p("cell_size", T::Float)],
    ),
];

/// Node types resolved without consulting the class database.
pub const CURATED_NODE_TYPES: &[&str] = &[
    "Node",
    "Node2D",
    "Node3D",
    "Sprite2D",
    "AnimatedSprite2D",
    "CharacterBody2D",
    "RigidBody2D",
    "StaticBody2D",
    "Area2D",
    "CollisionShape2D",
    "CollisionPolygon2D",
    "Camera2D",
    "CharacterBody3D",
    "RigidBody3D",
    "StaticBody3D",
    "Area3D",
    "CollisionShape3D",
    "MeshInstance3D",
    "Sprite3D",
    "Camera3D",
    "DirectionalLight3D",
    "OmniLight3D",
    "SpotLight3D",
    "WorldEnvironment",
    "Control",
    "Label",
    "Button",
    "Panel",
    "PanelContainer",
    "HBoxContainer",
    "VBoxContainer",
    "MarginContainer",
    "CenterContainer",
    "GridContainer",
    "ColorRect",
    "TextureRect",
    "LineEdit",
    "RichTextLabel",
    "ProgressBar",
    "CanvasLayer",
    "AudioStreamPlayer",
    "AudioStreamPlayer2D",
    "AudioStreamPlayer3D",
    "AnimationPlayer",
    "AnimationTree",
    "Timer",
];

/// Resource types resolved without consulting the class database.
pub const CURATED_RESOURCE_TYPES: &[&str] = &[
    "RectangleShape2D",
    "CircleShape2D",
    "CapsuleShape2D",
    "BoxShape3D",
    "SphereShape3D",
    "CapsuleShape3D",
    "CylinderShape3D",
    "BoxMesh",
    "SphereMesh",
    "CylinderMesh",
    "CapsuleMesh",
    "PlaneMesh",
    "StandardMaterial3D",
    "ShaderMaterial",
    "Shader",
    "GradientTexture1D",
    "GradientTexture2D",
    "NoiseTexture2D",
    "Curve",
    "Curve2D",
    "Curve3D",
    "Gradient",
    "Animation",
    "AnimationLibrary",
    "SpriteFrames",
    "Theme",
    "StyleBoxFlat",
    "Environment",
];

/// Lookup over the static class table.
pub struct ClassDb {
    classes: FxHashMap<&'static str, &'static ClassInfo>,
}

static GLOBAL: LazyLock<ClassDb> = LazyLock::new(ClassDb::build);

impl ClassDb {
    fn build() -> Self {
        let classes = CLASSES.iter().map(|c| (c.name, c)).collect();
        Self { classes }
    }

    /// The process-wide class database.
    pub fn global() -> &'static ClassDb {
        &GLOBAL
    }

    pub fn get(&self, name: &str) -> Option<&'static ClassInfo> {
        self.classes.get(name).copied()
    }

    /// The class itself followed by its ancestors, nearest first.
    pub fn ancestry(&self, name: &str) -> Vec<&'static ClassInfo> {
        let mut chain = Vec::new();
        let mut current = self.get(name);
        while let Some(class) = current {
            chain.push(class);
            current = class.parent.and_then(|p| self.get(p));
        }
        chain
    }

    pub fn inherits(&self, name: &str, base: &str) -> bool {
        self.ancestry(name).iter().any(|c| c.name == base)
    }

    /// Property declared on the class or any ancestor.
    pub fn find_property(&self, class: &str, property: &str) -> Option<&'static PropertyInfo> {
        self.ancestry(class)
            .into_iter()
            .find_map(|c| c.properties.iter().find(|p| p.name == property))
    }

    pub fn has_property(&self, class: &str, property: &str) -> bool {
        self.find_property(class, property).is_some()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Where a resolved type came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Curated,
    ClassDb,
}

/// Builds scene nodes of one class.
#[derive(Debug, Clone, Copy)]
pub struct NodeConstructor {
    pub class: &'static ClassInfo,
    pub source: LookupSource,
}

impl NodeConstructor {
    pub fn instantiate(&self, name: &str) -> SceneNode {
        SceneNode::new(name, self.class.name)
    }
}

/// Names the class of a standalone or embedded resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceConstructor {
    pub class: &'static ClassInfo,
    pub source: LookupSource,
}

impl ResourceConstructor {
    pub fn type_name(&self) -> &'static str {
        self.class.name
    }
}

/// Resolves user-supplied type names to constructors.
pub struct TypeRegistry {
    db: &'static ClassDb,
    nodes: FxHashMap<&'static str, &'static ClassInfo>,
    resources: FxHashMap<&'static str, &'static ClassInfo>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let db = ClassDb::global();
        let curated = |names: &[&str]| {
            names
                .iter()
                .filter_map(|n| db.get(n))
                .map(|c| (c.name, c))
                .collect::<FxHashMap<_, _>>()
        };
        Self {
            db,
            nodes: curated(CURATED_NODE_TYPES),
            resources: curated(CURATED_RESOURCE_TYPES),
        }
    }

    pub fn resolve_node(&self, name: &str) -> Option<NodeConstructor> {
        if let Some(class) = self.nodes.get(name) {
            return Some(NodeConstructor {
                class,
                source: LookupSource::Curated,
            });
        }
        self.fallback(name, ClassKind::Node).map(|class| NodeConstructor {
            class,
            source: LookupSource::ClassDb,
        })
    }

    pub fn resolve_resource(&self, name: &str) -> Option<ResourceConstructor> {
        if let Some(class) = self.resources.get(name) {
            return Some(ResourceConstructor {
                class,
                source: LookupSource::Curated,
            });
        }
        self.fallback(name, ClassKind::Resource)
            .map(|class| ResourceConstructor {
                class,
                source: LookupSource::ClassDb,
            })
    }

    fn fallback(&self, name: &str, kind: ClassKind) -> Option<&'static ClassInfo> {
        let class = self.db.get(name)?;
        if !class.instantiable || class.kind != kind {
            log::debug!(
                "type '{}' exists but is not an instantiable {:?}",
                name,
                kind
            );
            return None;
        }
        Some(class)
    }
}

/// Property assignment failure raised by the typed setters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssignError {
    #[error("Invalid property name: {property:?}")]
    InvalidName { property: String },
    #[error("Property '{property}' does not exist on {class}")]
    UnknownProperty { class: String, property: String },
    #[error("Type mismatch for property '{property}' on {class}: expected {expected}, got {found}")]
    TypeMismatch {
        class: String,
        property: String,
        expected: T,
        found: String,
    },
}

/// Coerce a value to a declared property type, if the two are compatible.
fn coerce(ty: T, value: Variant) -> Result<Variant, Variant> {
    match (ty, value) {
        (T::Any, v) => Ok(v),
        (T::Bool, v @ Variant::Bool(_)) => Ok(v),
        (T::Int, v @ Variant::Int(_)) => Ok(v),
        (T::Int, Variant::Float(f)) if f.fract() == 0.0 && f.is_finite() => {
            Ok(Variant::Int(f as i64))
        }
        (T::Float, v @ Variant::Float(_)) => Ok(v),
        (T::Float, Variant::Int(i)) => Ok(Variant::Float(i as f64)),
        (T::String, v @ (Variant::String(_) | Variant::StringName(_))) => Ok(v),
        (T::Vector2, v @ Variant::Vector2(_)) => Ok(v),
        (T::Vector3, v @ Variant::Vector3(_)) => Ok(v),
        (T::Color, v @ Variant::Color(_)) => Ok(v),
        (T::Rect2, v @ Variant::Rect2(_)) => Ok(v),
        (T::NodePath, v @ Variant::NodePath(_)) => Ok(v),
        (T::NodePath, Variant::String(s)) => Ok(Variant::NodePath(s)),
        (T::Array, v @ (Variant::Array(_) | Variant::Constructor { .. })) => Ok(v),
        (T::Dictionary, v @ Variant::Dictionary(_)) => Ok(v),
        (
            T::Resource,
            v @ (Variant::Nil | Variant::SubResource(_) | Variant::ExtResource(_)),
        ) => Ok(v),
        (_, v) => Err(v),
    }
}

fn typed_insert(
    properties: &mut IndexMap<String, Variant>,
    class: &str,
    info: &PropertyInfo,
    value: Variant,
) -> Result<(), AssignError> {
    let coerced = coerce(info.ty, value).map_err(|v| AssignError::TypeMismatch {
        class: class.to_string(),
        property: info.name.to_string(),
        expected: info.ty,
        found: v.type_name().to_string(),
    })?;
    properties.insert(info.name.to_string(), coerced);
    Ok(())
}

fn check_name(name: &str) -> Result<(), AssignError> {
    if tscn::is_property_key(name) {
        Ok(())
    } else {
        Err(AssignError::InvalidName {
            property: name.to_string(),
        })
    }
}

/// Construction-time setter: properties the class does not expose are
/// skipped and `Ok(false)` is returned. Known properties are type-checked.
/// Classes absent from the database accept any well-formed property name.
pub fn assign_if_exposed(
    properties: &mut IndexMap<String, Variant>,
    class: &str,
    name: &str,
    value: Variant,
) -> Result<bool, AssignError> {
    check_name(name)?;
    let db = ClassDb::global();
    if db.get(class).is_none() {
        properties.insert(name.to_string(), value);
        return Ok(true);
    }
    match db.find_property(class, name) {
        Some(info) => typed_insert(properties, class, info, value).map(|_| true),
        None => {
            log::debug!("skipping property '{}' not exposed by {}", name, class);
            Ok(false)
        }
    }
}

/// Modification-time setter: every property is applied; a name the class
/// does not expose is an assignment failure.
pub fn assign_strict(
    properties: &mut IndexMap<String, Variant>,
    class: &str,
    name: &str,
    value: Variant,
) -> Result<(), AssignError> {
    check_name(name)?;
    let db = ClassDb::global();
    if db.get(class).is_none() {
        properties.insert(name.to_string(), value);
        return Ok(());
    }
    let info = db
        .find_property(class, name)
        .ok_or_else(|| AssignError::UnknownProperty {
            class: class.to_string(),
            property: name.to_string(),
        })?;
    typed_insert(properties, class, info, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::variant::{Color, Vector2};
    use std::collections::HashSet;

    #[test]
    fn test_se004_class_names_unique_and_parents_exist() {
        let mut seen = HashSet::new();
        let db = ClassDb::global();
        for class in CLASSES {
            assert!(seen.insert(class.name), "duplicate class {}", class.name);
            if let Some(parent) = class.parent {
                let parent_info = db.get(parent).unwrap_or_else(|| {
                    panic!("{} has unknown parent {}", class.name, parent)
                });
                assert_eq!(parent_info.kind, class.kind, "{} kind", class.name);
            }
        }
        assert_eq!(db.len(), CLASSES.len());
    }

    #[test]
    fn test_se004_curated_tables_are_instantiable() {
        let db = ClassDb::global();
        for name in CURATED_NODE_TYPES {
            let c = db.get(name).unwrap();
            assert!(c.instantiable && c.kind == ClassKind::Node, "{}", name);
        }
        for name in CURATED_RESOURCE_TYPES {
            let c = db.get(name).unwrap();
            assert!(c.instantiable && c.kind == ClassKind::Resource, "{}", name);
        }
    }

    #[test]
    fn test_se004_resolve_curated_node() {
        let reg = TypeRegistry::new();
        let ctor = reg.resolve_node("Sprite2D").unwrap();
        assert_eq!(ctor.source, LookupSource::Curated);
        let node = ctor.instantiate("Hero");
        assert_eq!(node.name, "Hero");
        assert_eq!(node.type_name.as_deref(), Some("Sprite2D"));
    }

    #[test]
    fn test_se004_resolve_node_fallback() {
        let reg = TypeRegistry::new();
        let ctor = reg.resolve_node("Marker2D").unwrap();
        assert_eq!(ctor.source, LookupSource::ClassDb);
    }

    #[test]
    fn test_se004_resolve_rejects_abstract_and_unknown() {
        let reg = TypeRegistry::new();
        assert!(reg.resolve_node("CanvasItem").is_none());
        assert!(reg.resolve_node("NotAClass").is_none());
        assert!(reg.resolve_resource("Shape2D").is_none());
    }

    #[test]
    fn test_se004_resolve_checks_category() {
        let reg = TypeRegistry::new();
        assert!(reg.resolve_resource("Node2D").is_none());
        assert!(reg.resolve_node("BoxMesh").is_none());
        let res = reg.resolve_resource("PhysicsMaterial").unwrap();
        assert_eq!(res.source, LookupSource::ClassDb);
        assert_eq!(res.type_name(), "PhysicsMaterial");
    }

    #[test]
    fn test_se004_inheritance_queries() {
        let db = ClassDb::global();
        assert!(db.inherits("CharacterBody2D", "Node2D"));
        assert!(db.inherits("AnimationPlayer", "Node"));
        assert!(!db.inherits("Node2D", "Node3D"));
        assert!(db.has_property("Sprite2D", "position"));
        assert!(db.has_property("Sprite2D", "visible"));
        assert!(!db.has_property("Sprite2D", "velocity"));
        let names: Vec<_> = db.ancestry("Label").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Label", "Control", "CanvasItem", "Node"]);
    }

    #[test]
    fn test_se004_assign_if_exposed_skips_unknown() {
        let mut props = IndexMap::new();
        let applied =
            assign_if_exposed(&mut props, "Node2D", "bogus", Variant::Int(1)).unwrap();
        assert!(!applied);
        assert!(props.is_empty());
    }

    #[test]
    fn test_se004_assign_strict_rejects_unknown() {
        let mut props = IndexMap::new();
        let err = assign_strict(&mut props, "Node2D", "bogus", Variant::Int(1)).unwrap_err();
        assert!(matches!(err, AssignError::UnknownProperty { .. }));
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_se004_assign_type_mismatch() {
        let mut props = IndexMap::new();
        let err = assign_strict(
            &mut props,
            "Node2D",
            "position",
            Variant::String("left".into()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected Vector2"));
        let err = assign_if_exposed(&mut props, "ColorRect", "color", Variant::Int(3)).unwrap_err();
        assert!(matches!(err, AssignError::TypeMismatch { .. }));
    }

    #[test]
    fn test_se004_assign_coercions() {
        let mut props = IndexMap::new();
        assign_strict(&mut props, "Node2D", "rotation", Variant::Int(2)).unwrap();
        assert_eq!(props["rotation"], Variant::Float(2.0));
        assign_strict(&mut props, "Node2D", "z_index", Variant::Float(3.0)).unwrap();
        assert_eq!(props["z_index"], Variant::Int(3));
        assign_strict(&mut props, "MeshInstance3D", "skeleton", Variant::String("../Skel".into()))
            .unwrap();
        assert_eq!(props["skeleton"], Variant::NodePath("../Skel".into()));
        assert!(assign_strict(&mut props, "Node2D", "z_index", Variant::Float(1.5)).is_err());
    }

    #[test]
    fn test_se004_assign_native_values() {
        let mut props = IndexMap::new();
        assign_if_exposed(
            &mut props,
            "Sprite2D",
            "position",
            Variant::Vector2(Vector2 { x: 1.0, y: 2.0 }),
        )
        .unwrap();
        assign_if_exposed(&mut props, "Sprite2D", "modulate", Variant::Color(Color::default()))
            .unwrap();
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_se004_unknown_class_accepts_everything() {
        let mut props = IndexMap::new();
        assign_strict(&mut props, "MyCustomNode", "anything", Variant::Int(1)).unwrap();
        assert!(assign_if_exposed(&mut props, "MyCustomNode", "other", Variant::Nil).unwrap());
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_se004_static_bodies_expose_material_override() {
        let db = ClassDb::global();
        for class in ["StaticBody2D", "StaticBody3D", "RigidBody2D", "RigidBody3D"] {
            let info = db
                .find_property(class, "physics_material_override")
                .unwrap_or_else(|| panic!("{} lacks physics_material_override", class));
            assert_eq!(info.ty, T::Resource);
        }
    }

    #[test]
    fn test_se004_unknown_class_rejects_malformed_names() {
        let mut props = IndexMap::new();
        for name in ["bad key]", "", "1st", "a=b", "x\"y"] {
            let err = assign_strict(&mut props, "MyCustomNode", name, Variant::Int(1)).unwrap_err();
            assert!(matches!(err, AssignError::InvalidName { .. }), "{}", name);
            assert!(assign_if_exposed(&mut props, "MyCustomNode", name, Variant::Nil).is_err());
        }
        assert!(props.is_empty());
        assign_strict(&mut props, "MyCustomNode", "metadata/tag", Variant::Int(1)).unwrap();
        assert_eq!(props.len(), 1);
    }
}
