/// STL parser for binary and ASCII formats.
///
/// Each ASCII `solid <name>` block becomes one sub-mesh; a binary file holds a
/// single unnamed solid.
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending, space0},
    combinator::all_consuming,
    multi::{count, many0, many1},
    number::complete::{float, le_f32, le_u32},
    sequence::{preceded, terminated, tuple},
    IResult,
};

use nalgebra::Vector3;

use super::fallback_name;
use crate::geometry::{Model, SubMesh, Vertex};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Parse a binary STL file into one sub-mesh called `name`
pub fn parse_binary_stl(data: &[u8], name: &str) -> Result<Model, String> {
    if data.len() < HEADER_LEN + 4 {
        return Err("File too small to be a valid STL".to_string());
    }
    let (body, triangle_count) =
        binary_header(data).map_err(|e| format!("Invalid STL header: {:?}", e))?;
    let triangle_count = triangle_count as usize;
    if body.len() < triangle_count * FACET_LEN {
        return Err("Unexpected end of file".to_string());
    }

    let (_, facets) = count(binary_facet, triangle_count)(body)
        .map_err(|e| format!("Failed to parse binary STL: {:?}", e))?;

    let mut mesh = SubMesh::with_capacity(name, triangle_count * 3, triangle_count * 3);
    for (normal, corners) in facets {
        push_facet(&mut mesh, normal, corners);
    }
    Ok(Model::new(vec![mesh]))
}

fn binary_header(input: &[u8]) -> IResult<&[u8], u32> {
    preceded(take(HEADER_LEN), le_u32)(input)
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], (f32, f32, f32)> {
    tuple((le_f32, le_f32, le_f32))(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], ((f32, f32, f32), [(f32, f32, f32); 3])> {
    let (input, normal) = binary_vector(input)?;
    let (input, v0) = binary_vector(input)?;
    let (input, v1) = binary_vector(input)?;
    let (input, v2) = binary_vector(input)?;
    // Attribute byte count
    let (input, _) = take(2usize)(input)?;
    Ok((input, (normal, [v0, v1, v2])))
}

/// Parse an ASCII STL file; unnamed solids get positional names
pub fn parse_ascii_stl(input: &str) -> Result<Model, String> {
    match all_consuming(parse_ascii_stl_impl)(input) {
        Ok((_, solids)) => Ok(Model::new(
            solids
                .into_iter()
                .enumerate()
                .map(|(index, (name, facets))| {
                    let name = if name.is_empty() {
                        fallback_name(index)
                    } else {
                        name.to_string()
                    };
                    let mut mesh = SubMesh::with_capacity(name, facets.len() * 3, facets.len() * 3);
                    for (normal, corners) in facets {
                        push_facet(&mut mesh, normal, corners);
                    }
                    mesh
                })
                .collect(),
        )),
        Err(e) => Err(format!("Failed to parse ASCII STL: {:?}", e)),
    }
}

type Facet = ((f32, f32, f32), [(f32, f32, f32); 3]);

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Vec<(&str, Vec<Facet>)>> {
    terminated(many1(parse_solid), multispace0)(input)
}

fn parse_solid(input: &str) -> IResult<&str, (&str, Vec<Facet>)> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, name) = preceded(space0, not_line_ending)(input)?;
    let (input, facets) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    // Optional repeated name
    let (input, _) = not_line_ending(input)?;
    Ok((input, (name.trim(), facets)))
}

fn parse_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, (normal, [v1, v2, v3])))
}

fn parse_vertex(input: &str) -> IResult<&str, (f32, f32, f32)> {
    preceded(preceded(multispace0, tag("vertex")), parse_vector3)(input)
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

/// Append one facet, deriving the normal from the winding when the file stores none
fn push_facet(mesh: &mut SubMesh, normal: (f32, f32, f32), corners: [(f32, f32, f32); 3]) {
    let [v0, v1, v2] = corners.map(|(x, y, z)| Vertex::new(x, y, z, normal.0, normal.1, normal.2));
    let stored = Vector3::new(normal.0, normal.1, normal.2);
    let normal = stored
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(|| SubMesh::face_normal([&v0, &v1, &v2]));
    mesh.push_triangle(
        Vertex::at(v0.position, normal),
        Vertex::at(v1.position, normal),
        Vertex::at(v2.position, normal),
    );
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8], name: &str) -> Result<Model, String> {
    // Binary files may also start with "solid", so fall through on failure
    if data.len() > 5 && &data[0..5] == b"solid" {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(model) = parse_ascii_stl(text) {
                return Ok(model);
            }
        }
    }

    parse_binary_stl(data, name)
}
